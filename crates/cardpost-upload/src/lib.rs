#![warn(missing_docs)]
//! # cardpost-upload
//!
//! ## Purpose
//! Implements the upload orchestrator: the state machine governing
//! credential consumption and upload-target resolution.
//!
//! ## Responsibilities
//! - Enforce single-flight uploads through an explicit phase machine.
//! - Preflight the size ceiling before any network call.
//! - Derive the per-attempt intent from the credential store.
//! - Execute the single 401-triggered fallback from replace to create.
//! - Consume the credential exactly once per successful replace flow.
//!
//! ## Data flow
//! Credential store snapshot -> intent -> request descriptor ->
//! [`UploadTransport`] -> response interpretation -> store mutation +
//! [`UploadOutcome`] for the renderer.
//!
//! ## Ownership and lifetimes
//! The orchestrator is the only writer of the credential store during an
//! attempt; it borrows the store mutably for the whole call, so no other
//! mutation can interleave.
//!
//! ## Error model
//! All failure paths surface as [`UploadError`]; [`classify_upload_failure`]
//! separates preflight rejections (no network traffic happened) from
//! terminal attempt failures.
//!
//! ## Security and privacy notes
//! The orchestrator forwards key material only inside request descriptors
//! and never logs it.
//!
//! ## Example
//! ```rust
//! use cardpost_upload::UploadPhase;
//!
//! assert_eq!(UploadPhase::Idle.is_busy(), false);
//! assert_eq!(UploadPhase::Uploading.is_busy(), true);
//! ```

use std::sync::Arc;

use cardpost_contract::{CardResult, ContractError, parse_card_result};
use cardpost_core::{ImageFile, MAX_UPLOAD_BYTES, UploadIntent};
use cardpost_credential::{CredentialError, CredentialStore, validate_origin};
use cardpost_request::{RequestError, build_upload_request};
use thiserror::Error;
use url::Url;

/// HTTP status that triggers the replace-to-create fallback.
const STATUS_UNAUTHORIZED: u16 = 401;

/// Raw response handed back by an upload transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl UploadResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract transport used by the orchestrator.
pub trait UploadTransport: Send + Sync {
    /// Executes one upload request to completion.
    ///
    /// # Errors
    /// Returns [`UploadError::Transport`] for network-level failures; HTTP
    /// error statuses are returned as ordinary [`UploadResponse`] values
    /// for the orchestrator to interpret.
    fn send(
        &self,
        request: &cardpost_request::UploadRequest,
    ) -> Result<UploadResponse, UploadError>;
}

/// Orchestrator phase. One upload may be in flight at a time; concurrent
/// attempts are rejected while `Uploading`, never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    /// No attempt has run yet, or the machine was reset.
    Idle,
    /// An attempt is in flight.
    Uploading,
    /// The last attempt succeeded.
    Succeeded,
    /// The last attempt failed.
    Failed,
}

impl UploadPhase {
    /// Returns `true` while an attempt is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Uploading)
    }
}

/// What the attempt effectively did, after any fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveOutcome {
    /// A new card was created.
    Created,
    /// An existing card was replaced.
    Replaced,
}

/// Successful attempt summary consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Effective outcome after any 401 fallback.
    pub effective: EffectiveOutcome,
    /// Whether the attempt started as a replace and fell back to create.
    pub fell_back: bool,
    /// Parsed card payload from the final response.
    pub result: CardResult,
}

/// Upload orchestrator bound to one backend origin.
pub struct UploadOrchestrator {
    origin: Url,
    callback_url: Option<Url>,
    transport: Arc<dyn UploadTransport>,
    phase: UploadPhase,
}

impl UploadOrchestrator {
    /// Creates an orchestrator for a validated origin.
    ///
    /// # Errors
    /// Returns [`UploadError::Credential`] when the origin violates client
    /// policy.
    pub fn new(origin: Url, transport: Arc<dyn UploadTransport>) -> Result<Self, UploadError> {
        validate_origin(&origin)?;
        Ok(Self {
            origin,
            callback_url: None,
            transport,
            phase: UploadPhase::Idle,
        })
    }

    /// Configures the webhook URL forwarded with replace requests.
    pub fn with_callback_url(mut self, callback_url: Url) -> Self {
        self.callback_url = Some(callback_url);
        self
    }

    /// Returns the current phase snapshot.
    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// Returns `true` while an attempt is in flight.
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Returns the configured backend origin.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Runs one upload attempt to completion.
    ///
    /// Transition logic:
    /// 1. Reject with no network call while busy or when the file exceeds
    ///    [`MAX_UPLOAD_BYTES`]; the busy flag stays untouched.
    /// 2. Derive the intent from the store: key held means replace, with
    ///    the bound id when one exists.
    /// 3. On 401 for a replace intent, clear the credential and re-issue
    ///    once as a fresh create; the effective outcome becomes a create.
    /// 4. Any other non-2xx status is terminal for this attempt.
    /// 5. After a successful direct replace, clear the credential
    ///    (one-shot). A fallback flow was already cleared by step 3.
    ///
    /// The phase always leaves `Uploading` before this method returns, so
    /// the next attempt starts clean.
    ///
    /// # Errors
    /// Returns [`UploadError`] for preflight rejections and terminal
    /// attempt failures; see [`classify_upload_failure`].
    pub fn upload(
        &mut self,
        store: &mut CredentialStore,
        file: &ImageFile,
    ) -> Result<UploadOutcome, UploadError> {
        if self.is_busy() {
            return Err(UploadError::Busy);
        }

        if file.exceeds_size_ceiling() {
            return Err(UploadError::FileTooLarge {
                size_bytes: file.size_bytes(),
                limit_bytes: MAX_UPLOAD_BYTES,
            });
        }

        self.phase = UploadPhase::Uploading;
        let outcome = self.attempt(store, file);
        self.phase = match &outcome {
            Ok(_) => UploadPhase::Succeeded,
            Err(_) => UploadPhase::Failed,
        };

        outcome
    }

    fn attempt(
        &self,
        store: &mut CredentialStore,
        file: &ImageFile,
    ) -> Result<UploadOutcome, UploadError> {
        let intent = UploadIntent::for_credential(store.credential());
        let api_key = store
            .credential()
            .map(|credential| credential.api_key.clone());

        let request = build_upload_request(
            &self.origin,
            &intent,
            api_key.as_deref(),
            file,
            self.callback_url.as_ref(),
        )?;

        let mut effective = if intent.is_replace() {
            EffectiveOutcome::Replaced
        } else {
            EffectiveOutcome::Created
        };
        let mut fell_back = false;

        let mut response = self.transport.send(&request)?;

        if response.status == STATUS_UNAUTHORIZED && intent.is_replace() {
            // The key is dead either way; drop it before the fallback so a
            // failed create still leaves the store empty.
            store.clear_key();

            let fallback = build_upload_request(
                &self.origin,
                &UploadIntent::Create,
                None,
                file,
                self.callback_url.as_ref(),
            )?;
            response = self.transport.send(&fallback)?;
            effective = EffectiveOutcome::Created;
            fell_back = true;
        }

        if !response.is_success() {
            return Err(UploadError::Http(response.status));
        }

        let result = parse_card_result(&response.body)?;

        if effective == EffectiveOutcome::Replaced {
            // One-shot consumption after a successful direct replace.
            store.clear_key();
        }

        Ok(UploadOutcome {
            effective,
            fell_back,
            result,
        })
    }
}

/// Coarse failure class used to pick the reporting surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rejected before any network call; report synchronously.
    Preflight,
    /// The attempt ran and failed; report as an expiring inline notice.
    Terminal,
}

/// Classifies an upload failure for presentation.
pub fn classify_upload_failure(error: &UploadError) -> FailureClass {
    match error {
        UploadError::Busy
        | UploadError::FileTooLarge { .. }
        | UploadError::Request(_)
        | UploadError::Credential(_) => FailureClass::Preflight,
        UploadError::Http(_) | UploadError::Transport(_) | UploadError::Contract(_) => {
            FailureClass::Terminal
        }
    }
}

/// Errors produced by the upload orchestrator.
#[derive(Debug, Error)]
pub enum UploadError {
    /// An attempt is already in flight; concurrent attempts are rejected.
    #[error("an upload is already in flight")]
    Busy,
    /// File exceeds the fixed upload ceiling.
    #[error("file too large: {size_bytes} bytes exceeds {limit_bytes} byte ceiling")]
    FileTooLarge {
        /// Selected file size.
        size_bytes: u64,
        /// Fixed ceiling the backend enforces as well.
        limit_bytes: u64,
    },
    /// Request descriptor could not be built.
    #[error("request build failure: {0}")]
    Request(#[from] RequestError),
    /// Credential/origin policy failure.
    #[error("credential failure: {0}")]
    Credential(#[from] CredentialError),
    /// Terminal non-2xx response.
    #[error("upload failed ({0})")]
    Http(u16),
    /// Network-level transport failure.
    #[error("upload transport failure: {0}")]
    Transport(String),
    /// Final response violated the card contract.
    #[error("card contract failure: {0}")]
    Contract(#[from] ContractError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for phase transitions and credential consumption.

    use std::sync::Mutex;

    use super::*;

    struct ScriptedTransport {
        responses: Mutex<Vec<UploadResponse>>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<UploadResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent_paths(&self) -> Vec<String> {
            self.sent.lock().expect("sent lock should work").clone()
        }
    }

    impl UploadTransport for ScriptedTransport {
        fn send(
            &self,
            request: &cardpost_request::UploadRequest,
        ) -> Result<UploadResponse, UploadError> {
            self.sent
                .lock()
                .expect("sent lock should work")
                .push(request.url.path().to_string());
            let mut responses = self.responses.lock().expect("response lock should work");
            if responses.is_empty() {
                return Err(UploadError::Transport("script exhausted".to_string()));
            }
            Ok(responses.remove(0))
        }
    }

    fn ok_body(card_id: &str) -> String {
        format!(
            "{{\"card_id\":\"{card_id}\",\"status\":\"done\",\"detected_image_url\":\"/img/{card_id}.png\"}}"
        )
    }

    fn orchestrator(responses: Vec<UploadResponse>) -> (UploadOrchestrator, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(responses));
        let origin = Url::parse("http://cards.example.test").expect("origin should parse");
        let scripted: Arc<dyn UploadTransport> = transport.clone();
        let orchestrator =
            UploadOrchestrator::new(origin, scripted).expect("orchestrator should build");
        (orchestrator, transport)
    }

    fn small_file() -> ImageFile {
        ImageFile::new("photo.jpg", "image/jpeg", vec![0; 16]).expect("file should build")
    }

    #[test]
    fn oversize_file_is_rejected_without_network_traffic() {
        let (mut orchestrator, transport) = orchestrator(vec![]);
        let mut store = CredentialStore::new();
        let big = ImageFile::new(
            "big.png",
            "image/png",
            vec![0; (MAX_UPLOAD_BYTES + 1) as usize],
        )
        .expect("file should build");

        let error = orchestrator
            .upload(&mut store, &big)
            .expect_err("oversize file must be rejected");
        assert!(matches!(error, UploadError::FileTooLarge { .. }));
        assert!(!orchestrator.is_busy());
        assert!(transport.sent_paths().is_empty());
    }

    #[test]
    fn direct_replace_success_consumes_credential_once() {
        let (mut orchestrator, _transport) = orchestrator(vec![UploadResponse {
            status: 200,
            body: ok_body("c1"),
        }]);
        let mut store = CredentialStore::new();
        store
            .set_key("k1", Some("c1"))
            .expect("key should be stored");

        let outcome = orchestrator
            .upload(&mut store, &small_file())
            .expect("replace should succeed");
        assert_eq!(outcome.effective, EffectiveOutcome::Replaced);
        assert!(!outcome.fell_back);
        assert!(!store.has_key());
        assert_eq!(orchestrator.phase(), UploadPhase::Succeeded);
    }

    #[test]
    fn fallback_issues_exactly_two_requests_and_clears_key() {
        let (mut orchestrator, transport) = orchestrator(vec![
            UploadResponse {
                status: 401,
                body: String::new(),
            },
            UploadResponse {
                status: 201,
                body: ok_body("c2"),
            },
        ]);
        let mut store = CredentialStore::new();
        store
            .set_key("bad", None::<String>)
            .expect("key should be stored");

        let outcome = orchestrator
            .upload(&mut store, &small_file())
            .expect("fallback create should succeed");
        assert_eq!(outcome.effective, EffectiveOutcome::Created);
        assert!(outcome.fell_back);
        assert!(!store.has_key());
        assert_eq!(transport.sent_paths(), vec!["/cards/replace", "/cards"]);
    }

    #[test]
    fn create_401_is_terminal_not_recursive() {
        let (mut orchestrator, transport) = orchestrator(vec![UploadResponse {
            status: 401,
            body: String::new(),
        }]);
        let mut store = CredentialStore::new();

        let error = orchestrator
            .upload(&mut store, &small_file())
            .expect_err("create 401 must not fall back");
        assert!(matches!(error, UploadError::Http(401)));
        assert_eq!(transport.sent_paths(), vec!["/cards"]);
        assert_eq!(orchestrator.phase(), UploadPhase::Failed);
    }

    #[test]
    fn failed_direct_replace_without_401_retains_credential() {
        let (mut orchestrator, _transport) = orchestrator(vec![UploadResponse {
            status: 500,
            body: String::new(),
        }]);
        let mut store = CredentialStore::new();
        store
            .set_key("k1", Some("c1"))
            .expect("key should be stored");

        let error = orchestrator
            .upload(&mut store, &small_file())
            .expect_err("replace should fail");
        assert!(matches!(error, UploadError::Http(500)));
        assert!(store.has_key());
        assert!(!orchestrator.is_busy());
    }

    #[test]
    fn preflight_and_terminal_failures_classify_apart() {
        assert_eq!(
            classify_upload_failure(&UploadError::Busy),
            FailureClass::Preflight
        );
        assert_eq!(
            classify_upload_failure(&UploadError::FileTooLarge {
                size_bytes: 1,
                limit_bytes: 0,
            }),
            FailureClass::Preflight
        );
        assert_eq!(
            classify_upload_failure(&UploadError::Http(500)),
            FailureClass::Terminal
        );
        assert_eq!(
            classify_upload_failure(&UploadError::Transport("boom".to_string())),
            FailureClass::Terminal
        );
    }
}

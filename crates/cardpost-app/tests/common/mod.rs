//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use cardpost_app::clipboard::{ClipboardSink, CopyOutcome};
use cardpost_contract::KeyGrant;
use cardpost_core::ImageFile;
use cardpost_credential::{CredentialError, KeyTransport};
use cardpost_request::UploadRequest;
use cardpost_upload::{UploadError, UploadOrchestrator, UploadResponse, UploadTransport};
use url::Url;

/// Backend origin used by all scripted flows.
#[allow(dead_code)]
pub fn origin() -> Url {
    Url::parse("http://cards.example.test").expect("origin should parse")
}

/// Canned-response upload transport that records every request it sends.
#[allow(dead_code)]
pub struct ScriptedTransport {
    responses: Mutex<Vec<UploadResponse>>,
    sent: Mutex<Vec<UploadRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(responses: Vec<UploadResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Requests sent so far, in order.
    pub fn sent(&self) -> Vec<UploadRequest> {
        self.sent.lock().expect("sent lock should work").clone()
    }

    pub fn sent_paths(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

impl UploadTransport for ScriptedTransport {
    fn send(&self, request: &UploadRequest) -> Result<UploadResponse, UploadError> {
        self.sent
            .lock()
            .expect("sent lock should work")
            .push(request.clone());

        let mut responses = self.responses.lock().expect("response lock should work");
        if responses.is_empty() {
            return Err(UploadError::Transport(
                "scripted transport exhausted".to_string(),
            ));
        }
        Ok(responses.remove(0))
    }
}

/// Builds an orchestrator wired to a scripted transport.
#[allow(dead_code)]
pub fn orchestrator_with(transport: &Arc<ScriptedTransport>) -> UploadOrchestrator {
    let upload_transport: Arc<dyn UploadTransport> = transport.clone();
    UploadOrchestrator::new(origin(), upload_transport).expect("orchestrator should build")
}

/// Small valid JPEG fixture.
#[allow(dead_code)]
pub fn small_image() -> ImageFile {
    image_of_size(2 * 1024 * 1024)
}

/// Image fixture of an exact byte size.
#[allow(dead_code)]
pub fn image_of_size(size_bytes: usize) -> ImageFile {
    ImageFile::new("photo.jpg", "image/jpeg", vec![0xA5; size_bytes])
        .expect("image fixture should build")
}

/// 2xx card response body for `card_id`.
#[allow(dead_code)]
pub fn ok_response(status: u16, card_id: &str, image_url: &str) -> UploadResponse {
    let body = serde_json::json!({
        "card_id": card_id,
        "status": "done",
        "detected_image_url": image_url,
    });

    UploadResponse {
        status,
        body: body.to_string(),
    }
}

/// Bodyless response with an error status.
#[allow(dead_code)]
pub fn status_response(status: u16) -> UploadResponse {
    UploadResponse {
        status,
        body: String::new(),
    }
}

/// Recording clipboard with a scriptable failure mode.
#[allow(dead_code)]
pub struct MemoryClipboard {
    copies: Mutex<Vec<String>>,
    failure: Option<String>,
}

#[allow(dead_code)]
impl MemoryClipboard {
    pub fn working() -> Self {
        Self {
            copies: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            copies: Mutex::new(Vec::new()),
            failure: Some(reason.to_string()),
        }
    }

    pub fn copies(&self) -> Vec<String> {
        self.copies.lock().expect("copies lock should work").clone()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn copy_text(&self, text: &str) -> CopyOutcome {
        if let Some(reason) = &self.failure {
            return CopyOutcome::Failed(reason.clone());
        }

        self.copies
            .lock()
            .expect("copies lock should work")
            .push(text.to_string());
        CopyOutcome::Copied
    }
}

/// Key transport returning one fixed grant.
#[allow(dead_code)]
pub struct ScriptedKeyTransport {
    grant: KeyGrant,
}

#[allow(dead_code)]
impl ScriptedKeyTransport {
    pub fn new(card_id: &str, api_key: &str) -> Arc<Self> {
        Arc::new(Self {
            grant: KeyGrant {
                card_id: card_id.to_string(),
                api_key: api_key.to_string(),
                expires_at: 1_754_550_000.0,
            },
        })
    }
}

impl KeyTransport for ScriptedKeyTransport {
    fn generate_key(&self, _endpoint: &Url) -> Result<KeyGrant, CredentialError> {
        Ok(self.grant.clone())
    }
}

#![warn(missing_docs)]
//! # cardpost-app
//!
//! ## Purpose
//! Wires the credential store, request builder, upload orchestrator, and
//! card board into the user-facing flows.
//!
//! ## Responsibilities
//! - Run the key-generation flow: grant, store, format, copy.
//! - Run the upload flow: preflight, orchestrate, project onto the board.
//! - Check the runtime uploads kill switch.
//! - Provide the real HTTP transport and system clipboard sink.
//! - Redact key material from log-safe strings.
//!
//! ## Data flow
//! Shell command -> flow function -> orchestrator/key client through
//! injectable transports -> credential store mutation -> board projection.
//!
//! ## Ownership and lifetimes
//! Flow functions borrow the store, orchestrator, and board mutably for one
//! call; nothing holds cross-call references, so each flow observes a
//! consistent snapshot.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Clipboard writes are not
//! errors; they report [`clipboard::CopyOutcome`] so the primary flow never
//! blocks on them.
//!
//! ## Security and privacy notes
//! - Keys are logged only as store fingerprints.
//! - The formatted command embeds the raw key for out-of-band reuse; logs
//!   go through [`redact_key_material`] first.
//! - Uploads can be stopped at runtime via `CARDPOST_UPLOADS_ENABLED`.

pub mod clipboard;
pub mod http;

use cardpost_contract::KeyGrant;
use cardpost_core::{CoreError, ImageFile};
use cardpost_credential::{CredentialError, CredentialStore, KeyClient};
use cardpost_render::CardBoard;
use cardpost_request::{DEFAULT_FILE_ARG, RequestError, curl_command};
use cardpost_upload::{
    EffectiveOutcome, FailureClass, UploadError, UploadOrchestrator, UploadOutcome,
    classify_upload_failure,
};
use thiserror::Error;

use crate::clipboard::{ClipboardSink, CopyOutcome};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("CARDPOST_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Everything the key-generation flow hands back to the shell.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyHandout {
    /// Grant as returned by the backend.
    pub grant: KeyGrant,
    /// Formatted external command embedding the raw key.
    pub command: String,
    /// Outcome of the automatic clipboard copy.
    pub copy: CopyOutcome,
}

/// Runs the key-generation flow.
///
/// Requests a grant, stores it, formats the reproducible replace command,
/// and copies it to the clipboard. A failed copy is reported inside the
/// returned [`KeyHandout`], never as an error.
///
/// # Errors
/// Returns [`AppError::Credential`] when the grant request or storage
/// fails, and [`AppError::Request`] when the command cannot be formatted.
pub fn generate_key(
    client: &KeyClient,
    store: &mut CredentialStore,
    clipboard: &dyn ClipboardSink,
) -> Result<KeyHandout, AppError> {
    let grant = client.generate()?;
    store.set_grant(&grant)?;

    let command = curl_command(
        client.origin(),
        &grant.api_key,
        Some(&grant.card_id),
        DEFAULT_FILE_ARG,
    )?;
    let copy = clipboard.copy_text(&command);

    tracing::info!(
        card_id = %grant.card_id,
        key_fingerprint = store.fingerprint().as_deref().unwrap_or("-"),
        copied = copy.succeeded(),
        "key grant stored"
    );

    Ok(KeyHandout {
        grant,
        command,
        copy,
    })
}

/// Runs one upload flow end to end.
///
/// Shows the board's uploading placeholder for the duration of the attempt,
/// applies the outcome (patch or create) on success, and posts an expiring
/// failure notice for terminal failures. Preflight rejections (busy,
/// oversize, kill switch) carry no notice; the shell reports them
/// synchronously.
///
/// # Errors
/// Returns [`AppError::UploadsDisabled`] when the kill switch is off and
/// [`AppError::Upload`] for orchestrator failures.
pub fn upload_image(
    orchestrator: &mut UploadOrchestrator,
    store: &mut CredentialStore,
    board: &mut CardBoard,
    file: &ImageFile,
    now_ms: u64,
) -> Result<UploadOutcome, AppError> {
    if !uploads_enabled_from_env() {
        return Err(AppError::UploadsDisabled);
    }

    board.set_pending();
    let attempt = orchestrator.upload(store, file);
    board.clear_pending();

    match attempt {
        Ok(outcome) => {
            apply_outcome(board, &outcome, now_ms);
            tracing::info!(
                card_id = %outcome.result.card_id,
                effective = ?outcome.effective,
                fell_back = outcome.fell_back,
                "upload finished"
            );
            Ok(outcome)
        }
        Err(error) => {
            if classify_upload_failure(&error) == FailureClass::Terminal {
                board.push_error_notice(format!("Error: {error}"), now_ms);
            }
            tracing::warn!(error = %error, "upload failed");
            Err(AppError::Upload(error))
        }
    }
}

/// Projects one upload outcome onto the board.
///
/// An effective replace patches the rendered card in place and falls back
/// to create when no card with that id is rendered; an effective create
/// always creates.
pub fn apply_outcome(board: &mut CardBoard, outcome: &UploadOutcome, now_ms: u64) {
    match outcome.effective {
        EffectiveOutcome::Replaced => {
            if !board.patch_card(&outcome.result.card_id, &outcome.result, now_ms) {
                tracing::warn!(
                    card_id = %outcome.result.card_id,
                    "no rendered card for replace result; creating a new one"
                );
                board.create_card(&outcome.result, now_ms);
            }
        }
        EffectiveOutcome::Created => board.create_card(&outcome.result, now_ms),
    }
}

/// Checks the runtime uploads kill-switch env var.
///
/// Semantics:
/// - Unset => uploads enabled.
/// - `0`, `false`, `off` (case-insensitive) => uploads disabled.
/// - Any other value => uploads enabled.
pub fn uploads_enabled_from_env() -> bool {
    match std::env::var("CARDPOST_UPLOADS_ENABLED") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Redacts key material from a log-safe rendering of a command string.
pub fn redact_key_material(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    if let Some(position) = lower.find("x-api-key") {
        let prefix = &input[..position];
        return format!("{prefix}x-api-key: <redacted>");
    }

    input.to_string()
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Core model validation error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Credential store or key client error.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
    /// Request/command construction error.
    #[error("request error: {0}")]
    Request(#[from] RequestError),
    /// Upload orchestrator error.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
    /// Uploads are disabled by the runtime kill switch.
    #[error("uploads are disabled by CARDPOST_UPLOADS_ENABLED")]
    UploadsDisabled,
}

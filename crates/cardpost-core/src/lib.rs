#![warn(missing_docs)]
//! # cardpost-core
//!
//! ## Purpose
//! Defines the pure data model used across the `cardpost` workspace.
//!
//! ## Responsibilities
//! - Represent the short-lived card credential (API key + bound card id).
//! - Derive the per-attempt upload intent from credential state.
//! - Represent selected image files with owned byte buffers.
//! - Provide the upload size ceiling and content-type helpers.
//!
//! ## Data flow
//! Shell code builds an [`ImageFile`]; the orchestrator reads the current
//! [`Credential`] snapshot, derives an [`UploadIntent`], and hands both to
//! the request builder.
//!
//! ## Ownership and lifetimes
//! Files and credentials own their backing data (`Vec<u8>`, `String`) to
//! avoid hidden borrow coupling between the store, builder, and transport.
//!
//! ## Error model
//! Validation failures (blank key, blank bound id, empty file) return
//! [`CoreError`] variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate never logs or transforms key material; keys are opaque values
//! owned by the credential store.
//!
//! ## Example
//! ```rust
//! use cardpost_core::{Credential, UploadIntent};
//!
//! let credential = Credential::new("k1", Some("c1")).unwrap();
//! let intent = UploadIntent::for_credential(Some(&credential));
//! assert!(matches!(intent, UploadIntent::ReplaceById(id) if id == "c1"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted upload size in bytes (20 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Short-lived credential bound to a server-side card resource.
///
/// Invariant: a bound card id only exists together with a non-blank key.
/// Clearing the key always drops the bound id with it; the store enforces
/// this by replacing the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque API key issued by the backend.
    pub api_key: String,
    /// Card id the key is bound to, when the grant carried one.
    pub card_id: Option<String>,
}

impl Credential {
    /// Constructs a validated credential.
    ///
    /// # Errors
    /// Returns [`CoreError::BlankApiKey`] when the key is empty or
    /// whitespace-only, and [`CoreError::BlankCardId`] when a bound id is
    /// provided but blank.
    pub fn new(
        api_key: impl Into<String>,
        card_id: Option<impl Into<String>>,
    ) -> Result<Self, CoreError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CoreError::BlankApiKey);
        }

        let card_id = match card_id {
            Some(raw) => {
                let id = raw.into();
                if id.trim().is_empty() {
                    return Err(CoreError::BlankCardId);
                }
                Some(id)
            }
            None => None,
        };

        Ok(Self { api_key, card_id })
    }
}

/// Upload target derived from credential state.
///
/// Derived fresh on every attempt and never cached across attempts, so a
/// credential cleared mid-session can never leak a stale replace target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadIntent {
    /// No key held; create a new card.
    Create,
    /// Key held with a bound card id; replace that card.
    ReplaceById(String),
    /// Key held without a bound id; the server resolves the card.
    ReplaceByKeyOnly,
}

impl UploadIntent {
    /// Derives the intent for one upload attempt.
    pub fn for_credential(credential: Option<&Credential>) -> Self {
        match credential {
            Some(credential) => match &credential.card_id {
                Some(card_id) => Self::ReplaceById(card_id.clone()),
                None => Self::ReplaceByKeyOnly,
            },
            None => Self::Create,
        }
    }

    /// Returns `true` for either replace variant.
    pub fn is_replace(&self) -> bool {
        !matches!(self, Self::Create)
    }
}

/// One selected image file with owned bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name, used for the multipart part.
    pub file_name: String,
    /// MIME type sent with the multipart part.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Constructs a validated image file.
    ///
    /// # Errors
    /// Returns [`CoreError::BlankFileName`] for an empty name and
    /// [`CoreError::EmptyFile`] for a zero-byte buffer. Size ceiling
    /// enforcement is the orchestrator's preflight concern, not a
    /// constructor failure.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, CoreError> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(CoreError::BlankFileName);
        }

        if bytes.is_empty() {
            return Err(CoreError::EmptyFile);
        }

        Ok(Self {
            file_name,
            content_type: content_type.into(),
            bytes,
        })
    }

    /// Returns the file size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Returns `true` when the file exceeds [`MAX_UPLOAD_BYTES`].
    pub fn exceeds_size_ceiling(&self) -> bool {
        self.size_bytes() > MAX_UPLOAD_BYTES
    }
}

/// Guesses the MIME type for an image file name.
///
/// The backend accepts JPEG and PNG; anything else falls back to
/// `application/octet-stream` and is left for the server to reject.
pub fn guess_content_type(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    }
}

/// Error type for core model validation failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// API key is empty or whitespace-only.
    #[error("api key must be non-blank")]
    BlankApiKey,
    /// Bound card id was provided but blank.
    #[error("bound card id must be non-blank when present")]
    BlankCardId,
    /// File name is empty.
    #[error("file name must be non-blank")]
    BlankFileName,
    /// File buffer is empty.
    #[error("file contains no bytes")]
    EmptyFile,
}

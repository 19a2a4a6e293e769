#![warn(missing_docs)]
//! # cardpost-request
//!
//! ## Purpose
//! Builds outbound request descriptors and the equivalent external command
//! string from credential state and upload intent.
//!
//! ## Responsibilities
//! - Resolve the endpoint path for create/replace intents.
//! - Percent-encode card ids embedded in paths.
//! - Attach the key header and optional callback header.
//! - Format the reproducible `curl` command for out-of-band reuse.
//!
//! ## Data flow
//! Orchestrator derives an intent -> [`build_upload_request`] produces a
//! transport-agnostic [`UploadRequest`] -> a transport executes it.
//!
//! ## Ownership and lifetimes
//! Descriptors own their file bytes so a 401 fallback can issue a second
//! attempt without borrowing the first descriptor.
//!
//! ## Error model
//! Unusable origins and replace intents without key material return
//! [`RequestError`].
//!
//! ## Security and privacy notes
//! The formatted command string embeds the raw key; it exists for
//! out-of-band reuse, and callers decide where it may be written.

use cardpost_core::{ImageFile, UploadIntent};
use thiserror::Error;
use url::Url;

/// Multipart field name the backend reads the image from.
pub const UPLOAD_FIELD: &str = "image";

/// Header carrying the card-scoped API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Optional header naming a webhook the server notifies after a replace.
pub const CALLBACK_URL_HEADER: &str = "x-callback-url";

/// Placeholder file argument used in formatted commands.
pub const DEFAULT_FILE_ARG: &str = "/path/to/file.jpg";

/// Transport-agnostic upload request descriptor.
///
/// Every request is issued with session cookies included, independent of
/// the key header; the backend accepts both a session identity and a
/// resource-scoped key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Fully resolved endpoint URL.
    pub url: Url,
    /// Key header value, present for replace intents only.
    pub api_key: Option<String>,
    /// Webhook URL forwarded in [`CALLBACK_URL_HEADER`], when configured.
    pub callback_url: Option<Url>,
    /// File sent as the [`UPLOAD_FIELD`] multipart part.
    pub file: ImageFile,
}

/// Builds the upload request descriptor for one attempt.
///
/// # Errors
/// Returns [`RequestError::InvalidOrigin`] when `origin` cannot carry path
/// segments, and [`RequestError::MissingApiKey`] when a replace intent is
/// built without a key.
pub fn build_upload_request(
    origin: &Url,
    intent: &UploadIntent,
    api_key: Option<&str>,
    file: &ImageFile,
    callback_url: Option<&Url>,
) -> Result<UploadRequest, RequestError> {
    let (url, api_key) = match intent {
        UploadIntent::Create => (endpoint(origin, &["cards"])?, None),
        UploadIntent::ReplaceById(card_id) => (
            endpoint(origin, &["cards", card_id, "replace"])?,
            Some(required_key(api_key)?),
        ),
        UploadIntent::ReplaceByKeyOnly => (
            endpoint(origin, &["cards", "replace"])?,
            Some(required_key(api_key)?),
        ),
    };

    Ok(UploadRequest {
        url,
        api_key,
        callback_url: callback_url.cloned(),
        file: file.clone(),
    })
}

/// Resolves the key-generation endpoint.
///
/// # Errors
/// Returns [`RequestError::InvalidOrigin`] for origins without a path base.
pub fn genkey_url(origin: &Url) -> Result<Url, RequestError> {
    endpoint(origin, &["cards", "genkey"])
}

/// Resolves the replace endpoint for an optionally bound card id.
///
/// Shared by the request builder and the affordance projection so both
/// always agree on path shape.
///
/// # Errors
/// Returns [`RequestError::InvalidOrigin`] for origins without a path base.
pub fn replace_url(origin: &Url, card_id: Option<&str>) -> Result<Url, RequestError> {
    match card_id {
        Some(card_id) => endpoint(origin, &["cards", card_id, "replace"]),
        None => endpoint(origin, &["cards", "replace"]),
    }
}

/// Formats the reproducible external replace command.
///
/// Shape: `curl -X POST "<origin>/cards[/{id}]/replace" -H "x-api-key:
/// <key>" -F "image=@<file>"`. Path shape is delegated to [`replace_url`].
///
/// # Errors
/// Returns [`RequestError::MissingApiKey`] for a blank key and
/// [`RequestError::InvalidOrigin`] for origins without a path base.
pub fn curl_command(
    origin: &Url,
    api_key: &str,
    card_id: Option<&str>,
    file_arg: &str,
) -> Result<String, RequestError> {
    if api_key.trim().is_empty() {
        return Err(RequestError::MissingApiKey);
    }

    let url = replace_url(origin, card_id)?;
    Ok(format!(
        "curl -X POST \"{url}\" -H \"{API_KEY_HEADER}: {api_key}\" -F \"{UPLOAD_FIELD}=@{file_arg}\""
    ))
}

fn required_key(api_key: Option<&str>) -> Result<String, RequestError> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key.to_string()),
        _ => Err(RequestError::MissingApiKey),
    }
}

fn endpoint(origin: &Url, segments: &[&str]) -> Result<Url, RequestError> {
    let mut url = origin.clone();

    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| RequestError::InvalidOrigin(origin.to_string()))?;
        path.pop_if_empty();
        // `push` percent-encodes embedded ids.
        for segment in segments {
            path.push(segment);
        }
    }

    Ok(url)
}

/// Request construction errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Origin URL cannot carry path segments.
    #[error("origin cannot be used as an API base: {0}")]
    InvalidOrigin(String),
    /// Replace intent built without a usable key.
    #[error("replace requests require a non-blank api key")]
    MissingApiKey,
}

#![warn(missing_docs)]
//! # cardpost-contract
//!
//! ## Purpose
//! Defines the backend wire contract consumed by the upload controller.
//!
//! ## Responsibilities
//! - Parse card result payloads returned by create/replace endpoints.
//! - Parse key grant payloads returned by `POST /cards/genkey`.
//! - Preserve optional server fields for forward compatibility.
//!
//! ## Data flow
//! Raw JSON response body -> [`parse_card_result`] / [`parse_key_grant`] ->
//! orchestrator outcome handling and board rendering.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient
//! transport buffers.
//!
//! ## Error model
//! Invalid JSON or blank mandatory fields return [`ContractError`].
//!
//! ## Security and privacy notes
//! Key grants carry live key material; callers hand them straight to the
//! credential store and must not log the raw payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Card payload returned by the create and replace endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardResult {
    /// Server-assigned card identifier.
    pub card_id: String,
    /// Human-readable processing status.
    pub status: String,
    /// URL of the rendered detection result image.
    pub detected_image_url: String,
    /// Per-class detection scores, when the model reports them.
    #[serde(default)]
    pub scores: Option<BTreeMap<String, f32>>,
    /// Server-side update timestamp (ISO 8601).
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Name of the model that produced the detection.
    #[serde(default)]
    pub model: Option<String>,
}

/// Key grant returned by `POST /cards/genkey`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyGrant {
    /// Card the key is bound to.
    pub card_id: String,
    /// One-shot API key in plain text.
    pub api_key: String,
    /// Expiry in epoch seconds. Carried opaquely; the server is the only
    /// authority on expiry and signals it with a 401.
    pub expires_at: f64,
}

/// Parses raw JSON into a validated card result.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON.
/// Returns [`ContractError::InvalidContract`] when mandatory fields are
/// blank.
pub fn parse_card_result(raw: &str) -> Result<CardResult, ContractError> {
    let parsed: CardResult = serde_json::from_str(raw).map_err(ContractError::Decode)?;

    if parsed.card_id.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "card_id is empty".to_string(),
        ));
    }

    if parsed.detected_image_url.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "detected_image_url is empty".to_string(),
        ));
    }

    Ok(parsed)
}

/// Parses raw JSON into a validated key grant.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON.
/// Returns [`ContractError::InvalidContract`] when the card id or key is
/// blank.
pub fn parse_key_grant(raw: &str) -> Result<KeyGrant, ContractError> {
    let parsed: KeyGrant = serde_json::from_str(raw).map_err(ContractError::Decode)?;

    if parsed.card_id.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "card_id is empty".to_string(),
        ));
    }

    if parsed.api_key.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "api_key is empty".to_string(),
        ));
    }

    Ok(parsed)
}

/// Wire contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("contract decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("contract violation: {0}")]
    InvalidContract(String),
}

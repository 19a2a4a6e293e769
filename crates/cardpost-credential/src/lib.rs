#![warn(missing_docs)]
//! # cardpost-credential
//!
//! ## Purpose
//! Owns the short-lived card credential and its lifecycle.
//!
//! ## Responsibilities
//! - Hold the current API key and optional bound card id as one value.
//! - Expose set/clear/query operations with atomic key+id replacement.
//! - Project the dependent UI affordances from current state.
//! - Execute key generation through an injectable transport abstraction.
//!
//! ## Data flow
//! Shell requests a grant -> [`KeyClient::generate`] sends the request
//! through [`KeyTransport`] -> the grant lands in [`CredentialStore`] ->
//! the orchestrator reads and eventually consumes it (one-shot).
//!
//! ## Ownership and lifetimes
//! The store exclusively owns the credential; readers receive snapshots or
//! borrowed views, never shared mutable access.
//!
//! ## Error model
//! Blank key material, origin policy violations, and transport failures are
//! surfaced as [`CredentialError`].
//!
//! ## Security and privacy notes
//! Raw key values never appear in logs; [`CredentialStore::fingerprint`]
//! is the only log-safe representation.
//!
//! ## Example
//! ```rust
//! use cardpost_credential::CredentialStore;
//!
//! let mut store = CredentialStore::new();
//! store.set_key("k1", Some("c1")).unwrap();
//! assert!(store.has_key());
//! store.clear_key();
//! assert!(!store.has_key());
//! ```

use std::sync::Arc;

use cardpost_contract::{ContractError, KeyGrant};
use cardpost_core::{CoreError, Credential};
use cardpost_request::{RequestError, replace_url};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Length of the hex key fingerprint used in logs.
const FINGERPRINT_LEN: usize = 12;

/// Exclusive owner of the current card credential.
///
/// The bound card id lives inside the [`Credential`] value, so clearing the
/// key can never leave a dangling id behind.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    credential: Option<Credential>,
}

impl CredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self { credential: None }
    }

    /// Stores a key together with its optional bound card id.
    ///
    /// # Errors
    /// Returns [`CredentialError::Core`] for blank key material.
    pub fn set_key(
        &mut self,
        api_key: impl Into<String>,
        card_id: Option<impl Into<String>>,
    ) -> Result<(), CredentialError> {
        self.credential = Some(Credential::new(api_key, card_id)?);
        Ok(())
    }

    /// Stores the credential carried by a key grant.
    ///
    /// # Errors
    /// Returns [`CredentialError::Core`] when the grant carries blank
    /// fields, which [`cardpost_contract::parse_key_grant`] already rejects
    /// for wire payloads.
    pub fn set_grant(&mut self, grant: &KeyGrant) -> Result<(), CredentialError> {
        self.set_key(grant.api_key.clone(), Some(grant.card_id.clone()))
    }

    /// Resets to the empty credential.
    pub fn clear_key(&mut self) {
        self.credential = None;
    }

    /// Returns `true` while a non-blank key is held.
    pub fn has_key(&self) -> bool {
        self.credential.is_some()
    }

    /// Returns the current credential snapshot.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Projects the dependent affordances for the current state.
    ///
    /// # Errors
    /// Returns [`CredentialError::Request`] when `origin` cannot carry the
    /// replace path.
    pub fn affordances(&self, origin: &Url) -> Result<Affordances, CredentialError> {
        let replace_url = match &self.credential {
            Some(credential) => match &credential.card_id {
                Some(card_id) => Some(replace_url(origin, Some(card_id))?),
                None => None,
            },
            None => None,
        };

        Ok(Affordances {
            replace_url,
            command_copy_enabled: self.has_key(),
        })
    }

    /// Returns a short log-safe digest of the held key.
    pub fn fingerprint(&self) -> Option<String> {
        self.credential.as_ref().map(|credential| {
            let digest = Sha256::digest(credential.api_key.as_bytes());
            let mut hex = hex::encode(digest);
            hex.truncate(FINGERPRINT_LEN);
            hex
        })
    }
}

/// Dependent UI affordances derived from credential state.
///
/// Recomputed on every query; never stored, so it cannot drift from the
/// credential it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordances {
    /// Reusable replace URL, present only while a card id is bound.
    pub replace_url: Option<Url>,
    /// Whether the command-copy action is enabled.
    pub command_copy_enabled: bool,
}

/// Abstract transport used by the key client.
pub trait KeyTransport: Send + Sync {
    /// Sends the key-generation request.
    ///
    /// # Errors
    /// Returns [`CredentialError::Transport`] for network failures and
    /// [`CredentialError::Backend`] for non-success statuses.
    fn generate_key(&self, endpoint: &Url) -> Result<KeyGrant, CredentialError>;
}

/// Key-generation client bound to a validated origin.
#[derive(Clone)]
pub struct KeyClient {
    origin: Url,
    transport: Arc<dyn KeyTransport>,
}

impl KeyClient {
    /// Creates a validated key client.
    ///
    /// # Errors
    /// Returns [`CredentialError::InvalidOrigin`] when the origin violates
    /// [`validate_origin`] policy.
    pub fn new(origin: Url, transport: Arc<dyn KeyTransport>) -> Result<Self, CredentialError> {
        validate_origin(&origin)?;
        Ok(Self { origin, transport })
    }

    /// Requests a fresh key grant from the backend.
    ///
    /// # Errors
    /// Propagates transport and backend errors as-is for caller prompt
    /// behavior.
    pub fn generate(&self) -> Result<KeyGrant, CredentialError> {
        let endpoint = cardpost_request::genkey_url(&self.origin)?;
        self.transport.generate_key(&endpoint)
    }

    /// Returns the configured backend origin.
    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

/// Validates backend origin constraints.
///
/// The backend may run beside the client during development, so plain HTTP
/// is accepted alongside HTTPS; anything else is rejected.
///
/// # Errors
/// Returns [`CredentialError::InvalidOrigin`] for unsupported schemes or
/// host-less URLs.
pub fn validate_origin(origin: &Url) -> Result<(), CredentialError> {
    if origin.scheme() != "http" && origin.scheme() != "https" {
        return Err(CredentialError::InvalidOrigin(
            "origin must use http or https".to_string(),
        ));
    }

    if origin.host_str().is_none() {
        return Err(CredentialError::InvalidOrigin(
            "origin must include a host".to_string(),
        ));
    }

    Ok(())
}

/// Errors produced by credential state and key-generation logic.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Key material failed core validation.
    #[error("credential rejected: {0}")]
    Core(#[from] CoreError),
    /// Origin violates client policy.
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),
    /// Endpoint could not be resolved from the origin.
    #[error("endpoint resolution failed: {0}")]
    Request(#[from] RequestError),
    /// Network-level failure from the key transport.
    #[error("key transport failure: {0}")]
    Transport(String),
    /// Backend refused the key-generation request.
    #[error("key generation failed with status {0}")]
    Backend(u16),
    /// Grant payload violated the wire contract.
    #[error("key grant contract failure: {0}")]
    Contract(#[from] ContractError),
}

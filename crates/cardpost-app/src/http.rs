//! Blocking HTTP transport for the card backend.
//!
//! One client serves both transport seams (uploads and key generation). The
//! cookie jar keeps the backend session cookie on every request, independent
//! of the key header, since the backend accepts both identities.

use cardpost_contract::{KeyGrant, parse_key_grant};
use cardpost_credential::{CredentialError, KeyTransport};
use cardpost_request::{API_KEY_HEADER, CALLBACK_URL_HEADER, UPLOAD_FIELD, UploadRequest};
use cardpost_upload::{UploadError, UploadResponse, UploadTransport};
use reqwest::blocking::{Client, multipart};
use url::Url;

/// Blocking transport over `reqwest` with a persistent cookie jar.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the shared blocking client.
    ///
    /// No client-side timeout is configured; an issued request runs to
    /// completion or transport failure.
    ///
    /// # Errors
    /// Returns [`UploadError::Transport`] when the TLS/connection pool
    /// cannot be initialized.
    pub fn new() -> Result<Self, UploadError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|error| UploadError::Transport(error.to_string()))?;

        Ok(Self { client })
    }
}

impl UploadTransport for HttpTransport {
    fn send(&self, request: &UploadRequest) -> Result<UploadResponse, UploadError> {
        let part = multipart::Part::bytes(request.file.bytes.clone())
            .file_name(request.file.file_name.clone())
            .mime_str(&request.file.content_type)
            .map_err(|error| UploadError::Transport(error.to_string()))?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let mut builder = self.client.post(request.url.clone()).multipart(form);
        if let Some(api_key) = &request.api_key {
            builder = builder.header(API_KEY_HEADER, api_key);
        }
        if let Some(callback_url) = &request.callback_url {
            builder = builder.header(CALLBACK_URL_HEADER, callback_url.as_str());
        }

        let response = builder
            .send()
            .map_err(|error| UploadError::Transport(error.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| UploadError::Transport(error.to_string()))?;

        Ok(UploadResponse { status, body })
    }
}

impl KeyTransport for HttpTransport {
    fn generate_key(&self, endpoint: &Url) -> Result<KeyGrant, CredentialError> {
        let response = self
            .client
            .post(endpoint.clone())
            .send()
            .map_err(|error| CredentialError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialError::Backend(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|error| CredentialError::Transport(error.to_string()))?;
        Ok(parse_key_grant(&body)?)
    }
}

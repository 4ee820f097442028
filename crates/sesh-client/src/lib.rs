//! HTTP client for the sesh backend.
//!
//! Provides the venue directory lookups and the single multipart session
//! submission call, bearer-authenticated. Nothing else about the backend
//! is visible to the ingestion core.

pub mod api;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use api::SubmitResponse;
pub use sesh_core::Venue;

/// Submission is all-or-nothing: any failure discards the attempt and the
/// whole batch must be resubmitted.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Failed to reach the backend: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend refused the request and said why.
    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from the backend: {0}")]
    InvalidResponse(String),

    #[error("Invalid payload part: {0}")]
    InvalidPart(String),

    /// The per-item sequences disagree on length; submitting them would
    /// corrupt the listing.
    #[error("Payload sequences are not index-aligned")]
    MisalignedPayload,

    #[error("{0}")]
    Config(String),

    #[error("Failed to encode payload field: {0}")]
    Encode(#[from] serde_json::Error),
}

/// API version prefix (e.g. "/api/v1"). Set SESH_API_VERSION to match the
/// backend.
pub fn api_prefix() -> String {
    let version = std::env::var("SESH_API_VERSION").unwrap_or_else(|_| "v1".to_string());
    format!("/api/{}", version)
}

/// Bearer-authenticated HTTP client for the sesh backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: String, token: String) -> Result<Self, SubmitError> {
        // A full session submission can carry up to a gigabyte.
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create a client from the environment: SESH_API_URL (default
    /// http://localhost:3000) and SESH_API_TOKEN (required).
    pub fn from_env() -> Result<Self, SubmitError> {
        let base_url =
            std::env::var("SESH_API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let token = std::env::var("SESH_API_TOKEN")
            .map_err(|_| SubmitError::Config("Missing API token. Set SESH_API_TOKEN".to_string()))?;

        Self::new(base_url, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.token))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SubmitError> {
        let response = self
            .authorize(self.client.get(self.build_url(path)))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|error| SubmitError::InvalidResponse(error.to_string()))
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, SubmitError> {
        let response = self
            .authorize(self.client.post(self.build_url(path)).multipart(form))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|error| SubmitError::InvalidResponse(error.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SubmitError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }
}

/// Pull a human-readable message out of a backend error body. The backend
/// answers JSON with an `error` or `message` key; anything else is passed
/// through raw.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

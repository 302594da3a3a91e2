//! `IngestTransport` trait and the `reqwest`-backed implementation.
//!
//! The wire contract: `POST {base_url}/{training|testing}/data` with the
//! signed envelope JSON as the body and the clip name, label and API key
//! in headers. Any 2xx status is success; everything else is a rejection
//! whose body is surfaced for diagnostics only.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::IngestionConfig;

use super::dispatcher::Partition;

// ---------------------------------------------------------------------------
// UploadError
// ---------------------------------------------------------------------------

/// Errors that can occur while transmitting one envelope.
///
/// All variants are per-item: the dispatcher records the failure and
/// continues with the next clip.
#[derive(Debug, Error)]
pub enum UploadError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("upload request timed out")]
    Timeout,

    /// The service answered with a non-2xx status.
    #[error("ingestion rejected upload: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UploadError::Timeout
        } else {
            UploadError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// IngestTransport trait
// ---------------------------------------------------------------------------

/// Async interface to the ingestion endpoint.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn IngestTransport>`.
#[async_trait]
pub trait IngestTransport: Send + Sync {
    /// Transmit one signed envelope.
    ///
    /// # Arguments
    /// * `partition` – dataset partition the upload is tagged with.
    /// * `file_name` – basename of the source clip (`x-file-name` header).
    /// * `label`     – class label (`x-label` header).
    /// * `body`      – serialized envelope JSON.
    async fn upload(
        &self,
        partition: Partition,
        file_name: &str,
        label: &str,
        body: String,
    ) -> Result<(), UploadError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Talks to the real ingestion service over HTTPS.
///
/// All connection details (`base_url`, `api_key`, timeout) come from the
/// [`IngestionConfig`] passed to [`HttpTransport::from_config`].
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`. A default client is the last-resort fallback
    /// if the builder fails (should never happen in practice).
    pub fn from_config(config: &IngestionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, partition: Partition) -> String {
        format!("{}/{}/data", self.base_url, partition.as_str())
    }
}

#[async_trait]
impl IngestTransport for HttpTransport {
    async fn upload(
        &self,
        partition: Partition,
        file_name: &str,
        label: &str,
        body: String,
    ) -> Result<(), UploadError> {
        let response = self
            .client
            .post(self.endpoint(partition))
            .header("Content-Type", "application/json")
            .header("x-file-name", file_name)
            .header("x-label", label)
            .header("x-api-key", &self.api_key)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Surface the body for diagnostics; its structure is not parsed.
        let body = response.text().await.unwrap_or_default();
        Err(UploadError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// MockTransport (test double)
// ---------------------------------------------------------------------------


#[cfg(test)]
pub use mock::MockTransport;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

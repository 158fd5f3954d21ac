//! Multipart document upload to the remote analysis service
//!
//! `POST /upload` with `file` and `lang` fields. Upload progress is reported as
//! a 0-100 percentage while the body is streamed. HTTP ≥500 and timeouts are
//! retryable; other non-2xx statuses mean the request itself is at fault.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{RawAnalysisPayload, ValidatedDocument};

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Upload progress observer, called with 0-100
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Remote request failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote service unavailable")]
    Unavailable,

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed response payload: {0}")]
    Decode(String),
}

impl TransportError {
    /// Map a non-success HTTP status
    pub fn from_status(status: u16, body: String) -> Self {
        if status >= 500 {
            TransportError::Server { status, body }
        } else {
            TransportError::Rejected { status, body }
        }
    }

    /// Transient connectivity faults are retried; faults in the request or
    /// response content are not
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout
                | TransportError::Network(_)
                | TransportError::Unavailable
                | TransportError::Server { .. }
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Sends one document to the remote service
#[async_trait]
pub trait DocumentTransport: Send + Sync {
    async fn upload(
        &self,
        document: &ValidatedDocument,
        on_progress: ProgressCallback,
    ) -> Result<RawAnalysisPayload, TransportError>;
}

/// reqwest-backed multipart transport
pub struct HttpUploadTransport {
    http_client: reqwest::Client,
    upload_url: String,
}

impl HttpUploadTransport {
    pub fn new(upload_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            upload_url: upload_url.into(),
        })
    }

    fn file_part(
        document: &ValidatedDocument,
        on_progress: ProgressCallback,
    ) -> Result<Part, TransportError> {
        let contents = document.contents.clone();
        let total = contents.len();

        let chunks = (0..total).step_by(UPLOAD_CHUNK_BYTES).map(move |start| {
            let end = (start + UPLOAD_CHUNK_BYTES).min(total);
            let chunk = contents[start..end].to_vec();
            on_progress(percent(end, total));
            Ok::<Vec<u8>, std::io::Error>(chunk)
        });
        let body = reqwest::Body::wrap_stream(futures::stream::iter(chunks));

        Part::stream_with_length(body, total as u64)
            .file_name(document.file_name.clone())
            .mime_str(document.kind.mime_type())
            .map_err(|e| TransportError::Network(e.to_string()))
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

#[async_trait]
impl DocumentTransport for HttpUploadTransport {
    async fn upload(
        &self,
        document: &ValidatedDocument,
        on_progress: ProgressCallback,
    ) -> Result<RawAnalysisPayload, TransportError> {
        on_progress(0);

        let form = Form::new()
            .part("file", Self::file_part(document, on_progress.clone())?)
            .text("lang", document.language.clone());

        tracing::debug!(
            url = %self.upload_url,
            file_name = %document.file_name,
            size = document.size(),
            "Uploading document"
        );

        let response = self
            .http_client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        let payload: RawAnalysisPayload = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        tracing::info!(
            file_name = %document.file_name,
            clauses = payload.clauses.len(),
            results = payload.compliance_results.len(),
            "Document upload accepted"
        );

        Ok(payload)
    }
}

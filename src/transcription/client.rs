//! HTTP client for the hosted transcription service.
//!
//! Three calls: raw upload, job submission and job status. Every call carries
//! the credential in the `Authorization` header and fails with a
//! [`TransportError`] naming the operation and the HTTP status or cause.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, error, info};

use super::types::{JobSnapshot, TranscriptionRequestConfig};
use crate::asset::AudioAsset;
use crate::config::{Config, Credential};
use crate::error::TransportError;

/// Upload body is streamed in slices of this size so progress can be reported
const UPLOAD_CHUNK_BYTES: usize = 256 * 1024;

/// Receives upload progress as a percentage in `[0, 100]`.
pub type UploadObserver = Arc<dyn Fn(f64) + Send + Sync>;

/// The remote operations the rest of the crate relies on.
///
/// A job the service reports as failed is returned from `fetch_status` as a
/// normal [`JobSnapshot`]; only transport problems are errors here.
#[async_trait]
pub trait TranscriptionTransport: Send + Sync {
    /// Send the raw audio and return the service's URL for it.
    ///
    /// `on_progress` is best-effort and may never fire.
    async fn upload(
        &self,
        asset: &AudioAsset,
        on_progress: Option<UploadObserver>,
    ) -> Result<String, TransportError>;

    /// Submit a transcription job, returning its id
    async fn submit(&self, config: &TranscriptionRequestConfig) -> Result<String, TransportError>;

    async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, TransportError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// AssemblyAI v2 REST client
pub struct AssemblyAiClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl AssemblyAiClient {
    pub fn new(credential: Credential, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.credential.clone(), config.base_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(AUTHORIZATION, self.credential.expose())
    }

    async fn send(
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        let response = request.send().await.map_err(|e| {
            error!("{} request error: {}", operation, e);
            TransportError::network(operation, e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(status, &body);
        error!("{} error response ({}): {}", operation, status, detail);

        Err(TransportError::Status {
            operation,
            status: status.as_u16(),
            detail,
        })
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse {} response: {}", operation, e);
            TransportError::decode(operation, e)
        })
    }
}

#[async_trait]
impl TranscriptionTransport for AssemblyAiClient {
    async fn upload(
        &self,
        asset: &AudioAsset,
        on_progress: Option<UploadObserver>,
    ) -> Result<String, TransportError> {
        info!("Uploading {} ({} bytes)", asset.name(), asset.size());

        let request = self
            .request(reqwest::Method::POST, "/upload")
            .header(CONTENT_TYPE, "application/octet-stream");

        let request = match &on_progress {
            Some(observer) => request
                .header(CONTENT_LENGTH, asset.size())
                .body(progress_body(asset.data(), observer.clone())),
            None => request.body(asset.data()),
        };

        let response = Self::send("upload", request).await?;
        let parsed: UploadResponse = Self::parse("upload", response).await?;

        if let Some(observer) = on_progress {
            observer(100.0);
        }

        info!("Upload complete: {}", asset.name());
        Ok(parsed.upload_url)
    }

    async fn submit(&self, config: &TranscriptionRequestConfig) -> Result<String, TransportError> {
        let request = self
            .request(reqwest::Method::POST, "/transcript")
            .json(config);

        let response = Self::send("submit", request).await?;
        let parsed: SubmitResponse = Self::parse("submit", response).await?;

        info!(
            "Submitted transcription job {} (speaker_labels: {})",
            parsed.id, config.speaker_labels
        );
        Ok(parsed.id)
    }

    async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, TransportError> {
        let request = self.request(reqwest::Method::GET, &format!("/transcript/{}", job_id));

        let response = Self::send("status", request).await?;
        let snapshot: JobSnapshot = Self::parse("status", response).await?;

        debug!("Job {} is {}", snapshot.id, snapshot.status);
        Ok(snapshot)
    }
}

/// Streaming body that reports the share of bytes handed to the connection.
fn progress_body(data: Bytes, observer: UploadObserver) -> reqwest::Body {
    let total = data.len();
    let chunks: Vec<Bytes> = (0..total)
        .step_by(UPLOAD_CHUNK_BYTES)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_BYTES).min(total)))
        .collect();

    let mut sent = 0usize;
    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        observer(percent(sent, total));
        Ok::<Bytes, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}

fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Prefer the service's own `{"error": ...}` message, then the raw body.
fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    if let Some(msg) = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
    {
        return msg;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

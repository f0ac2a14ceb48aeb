//! Scripted transport for poller and controller tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::client::{TranscriptionTransport, UploadObserver};
use super::types::{JobSnapshot, JobStatus, TranscriptionRequestConfig};
use crate::asset::AudioAsset;
use crate::error::TransportError;

pub const TEST_UPLOAD_URL: &str = "https://cdn.test/upload/1";
pub const TEST_JOB_ID: &str = "job-1";

pub fn snapshot(status: JobStatus) -> JobSnapshot {
    JobSnapshot::new(TEST_JOB_ID, status)
}

pub fn test_asset() -> AudioAsset {
    AudioAsset::new("clip.wav", "audio/wav", vec![1u8, 2, 3, 4])
}

/// Plays back canned responses and counts calls.
pub struct ScriptedTransport {
    upload_result: Mutex<Result<String, TransportError>>,
    upload_progress: Vec<f64>,
    /// Keep the upload observer and call it again on every status call
    late_progress: bool,
    observer: Mutex<Option<UploadObserver>>,
    submit_result: Mutex<Result<String, TransportError>>,
    statuses: Mutex<VecDeque<Result<JobSnapshot, TransportError>>>,
    fallback_status: Option<JobSnapshot>,
    /// When set, each status call waits for one permit
    status_gate: Option<Arc<Semaphore>>,
    submitted: Mutex<Vec<TranscriptionRequestConfig>>,
    upload_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            upload_result: Mutex::new(Ok(TEST_UPLOAD_URL.to_string())),
            upload_progress: Vec::new(),
            late_progress: false,
            observer: Mutex::new(None),
            submit_result: Mutex::new(Ok(TEST_JOB_ID.to_string())),
            statuses: Mutex::new(VecDeque::new()),
            fallback_status: None,
            status_gate: None,
            submitted: Mutex::new(Vec::new()),
            upload_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_upload_error(self, err: TransportError) -> Self {
        *self.upload_result.lock() = Err(err);
        self
    }

    pub fn with_upload_progress(mut self, progress: Vec<f64>) -> Self {
        self.upload_progress = progress;
        self
    }

    /// Reports upload progress again while the job is being polled
    pub fn with_late_upload_progress(mut self) -> Self {
        self.late_progress = true;
        self
    }

    pub fn with_submit_error(self, err: TransportError) -> Self {
        *self.submit_result.lock() = Err(err);
        self
    }

    pub fn with_statuses(self, statuses: Vec<Result<JobSnapshot, TransportError>>) -> Self {
        *self.statuses.lock() = statuses.into();
        self
    }

    /// Returned once the scripted statuses run out
    pub fn with_fallback_status(mut self, status: JobSnapshot) -> Self {
        self.fallback_status = Some(status);
        self
    }

    pub fn with_status_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.status_gate = Some(gate);
        self
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<TranscriptionRequestConfig> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl TranscriptionTransport for ScriptedTransport {
    async fn upload(
        &self,
        _asset: &AudioAsset,
        on_progress: Option<UploadObserver>,
    ) -> Result<String, TransportError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(observer) = on_progress {
            for p in &self.upload_progress {
                observer(*p);
            }
            if self.late_progress {
                *self.observer.lock() = Some(observer);
            }
        }
        self.upload_result.lock().clone()
    }

    async fn submit(&self, config: &TranscriptionRequestConfig) -> Result<String, TransportError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().push(config.clone());
        self.submit_result.lock().clone()
    }

    async fn fetch_status(&self, _job_id: &str) -> Result<JobSnapshot, TransportError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let observer = self.observer.lock().clone();
        if let Some(observer) = observer {
            observer(100.0);
        }
        if let Some(gate) = &self.status_gate {
            gate.acquire().await.expect("status gate closed").forget();
        }
        let next = self.statuses.lock().pop_front();
        match next {
            Some(status) => status,
            None => self
                .fallback_status
                .clone()
                .ok_or_else(|| TransportError::network("status", "script exhausted")),
        }
    }
}

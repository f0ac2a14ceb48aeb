//! Wait for a submitted job to reach `completed` or `error`.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::client::TranscriptionTransport;
use super::types::{JobSnapshot, JobStatus};
use crate::error::TranscriptionError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How often to ask for job status and how long to keep asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Time between status checks
    pub interval: Duration,
    /// Maximum total wait before giving up
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Poll `job_id` until it is terminal, the timeout passes, or `cancel` fires.
///
/// `on_each_poll` sees every snapshot, including the first and the terminal one.
/// `queued` and `processing` both keep the loop going. The deadline is checked
/// after each non-terminal poll and the last wait is shortened so the final
/// status check lands on the deadline.
pub async fn await_completion<F>(
    transport: &dyn TranscriptionTransport,
    job_id: &str,
    options: &PollOptions,
    cancel: &CancellationToken,
    mut on_each_poll: F,
) -> Result<JobSnapshot, TranscriptionError>
where
    F: FnMut(&JobSnapshot),
{
    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => return Err(TranscriptionError::Cancelled),
            status = transport.fetch_status(job_id) => status?,
        };
        polls += 1;

        on_each_poll(&snapshot);

        match snapshot.status {
            JobStatus::Completed => {
                debug!("Job {} completed after {} polls", job_id, polls);
                return Ok(snapshot);
            }
            JobStatus::Error => {
                warn!("Job {} failed: {:?}", job_id, snapshot.error);
                return Err(TranscriptionError::job(snapshot.error.as_deref()));
            }
            JobStatus::Queued | JobStatus::Processing => {}
        }

        let elapsed = started.elapsed();
        if elapsed >= options.timeout {
            warn!(
                "Job {} still {} after {:.1}s ({} polls), giving up",
                job_id,
                snapshot.status,
                elapsed.as_secs_f64(),
                polls
            );
            return Err(TranscriptionError::Timeout(options.timeout));
        }

        let wait = options.interval.min(options.timeout - elapsed);
        tokio::select! {
            _ = cancel.cancelled() => return Err(TranscriptionError::Cancelled),
            _ = tokio::time::sleep(wait) => {}
        }
    }
}

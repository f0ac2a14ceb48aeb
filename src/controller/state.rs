//! Observable controller state: phase, progress, result and error.

use std::fmt;
use std::sync::Arc;

use crate::asset::AudioAsset;
use crate::transcription::TranscriptResult;

/// Share of the overall bar given to the upload step
pub const UPLOAD_WEIGHT: f64 = 0.4;
/// Share of the overall bar given to remote processing
pub const PROCESSING_WEIGHT: f64 = 0.6;

/// First processing value shown once the job is accepted
pub const PROCESSING_PLACEHOLDER_START: f64 = 50.0;
/// Processing placeholder never reaches this before the job completes
pub const PROCESSING_PLACEHOLDER_CEILING: f64 = 90.0;

/// Coarse lifecycle of one transcription attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Processing,
    Completed,
    Error,
}

impl Phase {
    /// An attempt is running; the start trigger should be disabled.
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Uploading | Phase::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Error)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Uploading => write!(f, "uploading"),
            Phase::Processing => write!(f, "processing"),
            Phase::Completed => write!(f, "completed"),
            Phase::Error => write!(f, "error"),
        }
    }
}

/// Upload and processing percentages plus the phase they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSnapshot {
    /// Meaningful while uploading
    pub upload: f64,
    /// Meaningful while processing or completed
    pub processing: f64,
    pub phase: Phase,
}

impl ProgressSnapshot {
    /// Weighted 0-100 value for a single progress bar.
    ///
    /// Upload fills the first 40%, processing the remaining 60%. An errored
    /// attempt keeps the value it had reached.
    pub fn overall(&self) -> f64 {
        let upload = self.upload.clamp(0.0, 100.0);
        let processing = self.processing.clamp(0.0, 100.0);
        match self.phase {
            Phase::Idle => 0.0,
            Phase::Uploading => upload * UPLOAD_WEIGHT,
            Phase::Processing => 100.0 * UPLOAD_WEIGHT + processing * PROCESSING_WEIGHT,
            Phase::Completed => 100.0,
            Phase::Error if processing > 0.0 => 100.0 * UPLOAD_WEIGHT + processing * PROCESSING_WEIGHT,
            Phase::Error => upload * UPLOAD_WEIGHT,
        }
    }
}

/// Stand-in processing percentage for a job that is still running.
///
/// The service reports no percentage, so this jumps to 50 on the first
/// non-terminal poll and then closes a quarter of the gap to 90 on each
/// later poll. Never decreases; only completion sets 100.
pub fn next_processing_placeholder(current: f64) -> f64 {
    if current < PROCESSING_PLACEHOLDER_START {
        PROCESSING_PLACEHOLDER_START
    } else {
        current + (PROCESSING_PLACEHOLDER_CEILING - current).max(0.0) / 4.0
    }
}

/// Everything the presentation layer reads from the controller.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub asset: Option<Arc<AudioAsset>>,
    pub phase: Phase,
    pub progress: ProgressSnapshot,
    pub result: Option<TranscriptResult>,
    pub error: Option<String>,
    /// Attempts begun so far; survives `reset()` and asset selection
    pub attempts: u64,
}

impl ControllerState {
    pub fn overall_progress(&self) -> f64 {
        self.progress.overall()
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.progress.phase = phase;
    }

    /// Back to idle, keeping only the selected asset
    pub(crate) fn clear_attempt(&mut self) {
        self.phase = Phase::Idle;
        self.progress = ProgressSnapshot::default();
        self.result = None;
        self.error = None;
    }
}

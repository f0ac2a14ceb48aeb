//! Wire and value types exchanged with the transcription service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest speaker count the service accepts as a diarization hint
pub const MIN_SPEAKERS: u32 = 2;

/// Remote job lifecycle as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// `completed` and `error` never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Speaker identifier. The service sends letters ("A"), older payloads numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeakerId {
    Index(u64),
    Label(String),
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerId::Index(i) => write!(f, "{}", i),
            SpeakerId::Label(l) => write!(f, "{}", l),
        }
    }
}

impl From<u64> for SpeakerId {
    fn from(i: u64) -> Self {
        SpeakerId::Index(i)
    }
}

impl From<&str> for SpeakerId {
    fn from(s: &str) -> Self {
        SpeakerId::Label(s.to_string())
    }
}

/// One speaker turn as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: SpeakerId,
    pub text: String,
    /// Start offset in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    /// End offset in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,
}

/// Current state of a remote job, straight from the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub utterances: Option<Vec<Utterance>>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub audio_duration: Option<f64>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl JobSnapshot {
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            text: None,
            error: None,
            utterances: None,
            confidence: None,
            audio_duration: None,
            language_code: None,
        }
    }
}

/// User-facing options handed to `start()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptionSettings {
    pub speaker_detection: bool,
    pub speaker_count: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            speaker_detection: false,
            speaker_count: MIN_SPEAKERS,
        }
    }
}

impl TranscriptionSettings {
    pub fn with_speakers(count: u32) -> Self {
        Self {
            speaker_detection: true,
            speaker_count: count,
        }
    }
}

/// Body of the submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionRequestConfig {
    pub audio_url: String,
    pub language_detection: bool,
    pub punctuate: bool,
    pub format_text: bool,
    pub speaker_labels: bool,
    /// Only sent when `speaker_labels` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speakers_expected: Option<u32>,
}

impl TranscriptionRequestConfig {
    pub fn new(audio_url: impl Into<String>) -> Self {
        Self {
            audio_url: audio_url.into(),
            language_detection: true,
            punctuate: true,
            format_text: true,
            speaker_labels: false,
            speakers_expected: None,
        }
    }

    /// Map UI settings onto recognition options for an uploaded file.
    pub fn from_settings(audio_url: impl Into<String>, settings: &TranscriptionSettings) -> Self {
        let mut config = Self::new(audio_url);
        if settings.speaker_detection {
            config.speaker_labels = true;
            config.speakers_expected = Some(settings.speaker_count.max(MIN_SPEAKERS));
        }
        config
    }
}

//! Remote transcription: service client, completion polling and transcripts.
//!
//! Talks to an AssemblyAI-compatible REST service. Nothing is transcribed locally.

pub mod client;
pub mod poller;
pub mod transcript;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{AssemblyAiClient, TranscriptionTransport, UploadObserver};
pub use poller::{await_completion, PollOptions, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
pub use transcript::{ExportFormat, TranscriptResult, TranscriptUtterance};
pub use types::{
    JobSnapshot, JobStatus, SpeakerId, TranscriptionRequestConfig, TranscriptionSettings,
    Utterance, MIN_SPEAKERS,
};

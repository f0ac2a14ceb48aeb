//! Upload an audio file to a hosted speech-to-text service, follow the job
//! until it finishes and hand back a (optionally speaker-split) transcript.
//!
//! [`TranscriptionController`] is the entry point: select an asset, call
//! `start`, and observe [`ControllerState`] through `subscribe()` or
//! `progress_events()`.

pub mod asset;
pub mod config;
pub mod controller;
pub mod error;
pub mod transcription;

pub use asset::{AssetError, AudioAsset};
pub use config::{Config, Credential};
pub use controller::{
    ControllerState, Phase, ProgressEvent, ProgressEvents, ProgressSnapshot, TranscriptionController,
};
pub use error::{ConfigError, TranscriptionError, TransportError};
pub use transcription::{
    ExportFormat, PollOptions, TranscriptResult, TranscriptionSettings, TranscriptionTransport,
};

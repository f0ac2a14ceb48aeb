//! Error types shared by the transport, poller and controller.

use std::time::Duration;
use thiserror::Error;

/// Fallback message when the service marks a job as failed without saying why.
pub const GENERIC_JOB_FAILURE: &str = "Transcription failed";

/// Failure talking to the remote service.
///
/// Only network/HTTP level problems end up here. A job the service itself
/// reports as failed is a normal status response, see [`TranscriptionError::Job`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The service answered with a non-success status.
    #[error("{operation} failed with status {status}: {detail}")]
    Status {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    /// The request never got a response (DNS, connect, reset, ...).
    #[error("{operation} failed: {message}")]
    Network {
        operation: &'static str,
        message: String,
    },
    /// The response arrived but could not be understood.
    #[error("{operation} returned an unexpected response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl TransportError {
    pub fn network(operation: &'static str, err: impl std::fmt::Display) -> Self {
        TransportError::Network {
            operation,
            message: err.to_string(),
        }
    }

    pub fn decode(operation: &'static str, err: impl std::fmt::Display) -> Self {
        TransportError::Decode {
            operation,
            message: err.to_string(),
        }
    }

    /// Which remote operation failed (`upload`, `submit` or `status`).
    pub fn operation(&self) -> &'static str {
        match self {
            TransportError::Status { operation, .. }
            | TransportError::Network { operation, .. }
            | TransportError::Decode { operation, .. } => operation,
        }
    }

    /// HTTP status, if the service responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Everything that can end a transcription attempt early.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The service reported the job as failed. Carries its message verbatim.
    #[error("{0}")]
    Job(String),
    #[error("Transcription timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The attempt was abandoned by `reset()` or a new asset selection.
    #[error("Transcription cancelled")]
    Cancelled,
}

impl TranscriptionError {
    pub fn job(message: Option<&str>) -> Self {
        match message {
            Some(msg) if !msg.trim().is_empty() => TranscriptionError::Job(msg.to_string()),
            _ => TranscriptionError::Job(GENERIC_JOB_FAILURE.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API credential is missing or empty")]
    MissingCredential,
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

//! Error types and handling
//!
//! Common error types used across the studio session.

use crate::capture::DeviceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A start or source operation was attempted without its preconditions
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionViolation {
    #[error("Enable the camera or screen capture first")]
    NoSourceEnabled,

    #[error("Enter a title for the stream")]
    EmptyTitle,

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("A live session is already in progress")]
    AlreadyLive,

    #[error("Stop the current recording or live session first")]
    SessionBusy,

    #[error("Sources cannot change while recording or live")]
    SourcesLocked,
}

/// Session-wide error type
#[derive(Error, Debug)]
pub enum StudioError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionViolation),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("No async runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<StudioError> for ErrorResponse {
    fn from(error: StudioError) -> Self {
        let code = match &error {
            StudioError::Device(DeviceError::PermissionDenied(_)) => "PERMISSION_DENIED",
            StudioError::Device(DeviceError::DeviceUnavailable(_)) => "DEVICE_UNAVAILABLE",
            StudioError::Device(DeviceError::Backend(_)) => "DEVICE_ERROR",
            StudioError::Precondition(_) => "PRECONDITION_FAILED",
            StudioError::Io(_) => "IO_ERROR",
            StudioError::Serialization(_) => "SERIALIZATION_ERROR",
            StudioError::Encoding(_) => "ENCODING_ERROR",
            StudioError::Runtime(_) => "RUNTIME_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using StudioError
pub type StudioResult<T> = Result<T, StudioError>;

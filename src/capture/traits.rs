//! Capture trait definitions
//!
//! Platform-agnostic description of capture sources and the device
//! acquisition seam the session talks to.

use super::stream::MediaStream;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A capturable input the user can toggle on and off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Camera,
    Screen,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Camera => f.write_str("camera"),
            SourceKind::Screen => f.write_str("screen"),
        }
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// What to ask the platform for when opening the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    /// Target capture size
    pub resolution: Resolution,

    /// Whether a microphone track is requested alongside the video
    pub microphone: bool,
}

/// What to ask the platform for when opening display capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenConstraints {
    /// Fixed capture size
    pub resolution: Resolution,

    /// Whether system audio is requested alongside the video
    pub audio: bool,
}

/// Information about an audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Whether this is the default device
    pub is_default: bool,
}

/// Information about a camera/webcam
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,
}

/// Information about a display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    /// Platform display ID
    pub id: u32,

    /// Display name
    pub name: String,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Whether this is the primary display
    pub is_primary: bool,
}

/// Why a device could not be acquired
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Capture backend error: {0}")]
    Backend(String),
}

/// Grants access to live capture devices.
///
/// Every successful call hands back a stream whose tracks the caller owns;
/// the caller is responsible for stopping them.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Open the user-facing camera, plus a microphone track when requested
    async fn open_camera(&self, constraints: &CameraConstraints) -> Result<MediaStream, DeviceError>;

    /// Open display capture with audio
    async fn open_screen(&self, constraints: &ScreenConstraints) -> Result<MediaStream, DeviceError>;
}

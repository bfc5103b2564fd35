//! Session state management
//!
//! Defines the session state machine and the values reported to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current mode of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Nothing running; sources may be toggled
    #[default]
    Idle,
    /// Composite stream is being recorded
    Recording,
    /// Simulated broadcast to viewers
    Live,
}

impl SessionMode {
    pub fn is_active(self) -> bool {
        self != SessionMode::Idle
    }
}

/// Result of a completed recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOutput {
    /// Where the artifact was downloaded to
    pub path: String,

    /// Size of the artifact in bytes
    pub size_bytes: u64,

    /// Number of chunks that were concatenated
    pub chunk_count: usize,

    /// Elapsed seconds when the recording stopped
    pub elapsed_secs: u64,
}

/// Summary of a finished live session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSummary {
    pub title: String,
    pub category: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: u64,
    pub peak_viewers: u32,
}

/// Read model of the whole session for the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: SessionMode,
    pub camera_enabled: bool,
    pub screen_enabled: bool,
    pub microphone_enabled: bool,
    pub elapsed_secs: u64,
    pub viewers: u32,
    pub live_title: Option<String>,
    pub live_category: Option<String>,
    pub live_started_at: Option<DateTime<Utc>>,
    pub stream_key: Option<String>,
}

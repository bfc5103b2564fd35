//! Events emitted by the capture session

use crate::capture::SourceKind;
use serde::Serialize;

/// Events broadcast to subscribers (the webview, tests)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SessionEvent {
    /// A source was acquired
    SourceEnabled { source: SourceKind },
    /// A source was released
    SourceDisabled { source: SourceKind },
    /// Recording started
    RecordingStarted,
    /// Recording finished and the artifact was downloaded
    RecordingStopped { path: String, size_bytes: u64 },
    /// Live session started
    LiveStarted { title: String, stream_key: String },
    /// Live session stopped
    LiveStopped { peak_viewers: u32 },
    /// Once per tick while recording or live
    Tick { elapsed_secs: u64, viewers: u32 },
    /// Message the user must see (failed acquisition, refused start)
    Notice { message: String },
}

//! Media streams, tracks and the exclusive source handle

use super::traits::SourceKind;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Layout of the raw bytes a track produces, as needed to encode them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum TrackFormat {
    /// Whole frames in an FFmpeg pixel format (`bgra`, `yuyv422`, `mjpeg`, ...)
    Video {
        width: u32,
        height: u32,
        fps: u32,
        pixel_format: String,
    },
    /// Interleaved little-endian f32 samples
    Audio { sample_rate: u32, channels: u16 },
}

/// Producer side of a track, implemented by capture backends.
pub trait TrackSource: Send + Sync {
    /// Whether the source is still producing
    fn is_live(&self) -> bool;

    /// Stop producing and release the underlying device. Must be idempotent.
    fn stop(&self);

    /// Start keeping encoded data for a recorder
    fn attach(&self);

    /// Stop keeping encoded data and discard whatever is pending
    fn detach(&self);

    /// Take the encoded bytes produced since the last call
    fn take_pending(&self) -> Vec<u8>;
}

/// A track source backed by an in-memory byte buffer.
///
/// Capture threads call [`BufferedTrack::push`]; data is only kept while a
/// recorder is attached, so an idle preview does not grow without bound.
#[derive(Debug)]
pub struct BufferedTrack {
    live: AtomicBool,
    attached: AtomicBool,
    pending: Mutex<Vec<u8>>,
}

impl BufferedTrack {
    pub fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            attached: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Append encoded data. Returns false once the track has been stopped.
    pub fn push(&self, data: &[u8]) -> bool {
        if !self.live.load(Ordering::SeqCst) {
            return false;
        }
        if self.attached.load(Ordering::SeqCst) {
            self.pending.lock().extend_from_slice(data);
        }
        true
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl Default for BufferedTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackSource for BufferedTrack {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.attached.store(false, Ordering::SeqCst);
        self.pending.lock().clear();
    }

    fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
        self.pending.lock().clear();
    }

    fn take_pending(&self) -> Vec<u8> {
        std::mem::take(&mut *self.pending.lock())
    }
}

/// One audio or video track of a stream
#[derive(Clone)]
pub struct MediaTrack {
    id: Uuid,
    kind: TrackKind,
    label: String,
    format: Option<TrackFormat>,
    source: Arc<dyn TrackSource>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>, source: Arc<dyn TrackSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            format: None,
            source,
        }
    }

    /// Describe the raw bytes this track produces
    pub fn with_format(mut self, format: TrackFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn format(&self) -> Option<&TrackFormat> {
        self.format.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.source.is_live()
    }

    pub fn stop(&self) {
        self.source.stop();
    }

    pub(crate) fn source(&self) -> &Arc<dyn TrackSource> {
        &self.source
    }
}

impl std::fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("format", &self.format)
            .field("live", &self.is_live())
            .finish()
    }
}

/// A live stream as handed out by a device backend
#[derive(Debug)]
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn has_kind(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|t| t.kind() == kind)
    }

    /// Stop every track of the stream
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

/// Exclusive owner of an acquired source stream.
///
/// Dropping the handle stops every track, so the device is released on all
/// exit paths.
#[derive(Debug)]
pub struct SourceHandle {
    kind: SourceKind,
    stream: MediaStream,
}

impl SourceHandle {
    pub fn new(kind: SourceKind, stream: MediaStream) -> Self {
        Self { kind, stream }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    /// Stop the tracks now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.stream.stop_all();
        tracing::info!("Released {} stream {}", self.kind, self.stream.id());
    }
}

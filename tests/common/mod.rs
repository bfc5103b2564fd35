//! Scripted devices and sinks shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use studio_session::capture::{
    BufferedTrack, CameraConstraints, DeviceError, MediaDevices, MediaStream, MediaTrack,
    ScreenConstraints, SourceKind, TrackFormat, TrackKind, TrackSource,
};
use studio_session::config::StudioConfig;
use studio_session::export::{ArtifactSink, EncodedMedia, MediaEncoder, RecordingArtifact};
use studio_session::recorder::{RecordedMedia, StudioSession};
use studio_session::utils::{StudioError, StudioResult};

/// A track handed out by [`ScriptedDevices`]
#[derive(Clone)]
pub struct OpenedTrack {
    pub source: SourceKind,
    pub kind: TrackKind,
    pub track: Arc<BufferedTrack>,
}

/// Device backend whose answers are set by the test
#[derive(Default)]
pub struct ScriptedDevices {
    pub deny_camera: AtomicBool,
    pub deny_screen: AtomicBool,
    pub opened: Mutex<Vec<OpenedTrack>>,
    pub camera_requests: Mutex<Vec<CameraConstraints>>,
}

impl ScriptedDevices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn open(&self, source: SourceKind, kinds: &[TrackKind]) -> MediaStream {
        let mut opened = self.opened.lock();
        let tracks = kinds
            .iter()
            .map(|&kind| {
                let track = Arc::new(BufferedTrack::new());
                opened.push(OpenedTrack {
                    source,
                    kind,
                    track: track.clone(),
                });
                let format = match kind {
                    TrackKind::Video => TrackFormat::Video {
                        width: 4,
                        height: 4,
                        fps: 15,
                        pixel_format: "bgra".to_string(),
                    },
                    TrackKind::Audio => TrackFormat::Audio {
                        sample_rate: 48_000,
                        channels: 2,
                    },
                };
                MediaTrack::new(kind, format!("{source}"), track).with_format(format)
            })
            .collect();
        MediaStream::new(tracks)
    }

    /// Tracks of `source` that are still live
    pub fn live_tracks(&self, source: SourceKind) -> Vec<OpenedTrack> {
        self.opened
            .lock()
            .iter()
            .filter(|t| t.source == source && t.track.is_live())
            .cloned()
            .collect()
    }

    pub fn all_stopped(&self) -> bool {
        self.opened.lock().iter().all(|t| !t.track.is_live())
    }

    /// Push `data` into every live track of `source`; returns bytes pushed
    pub fn feed(&self, source: SourceKind, data: &[u8]) -> usize {
        let tracks = self.live_tracks(source);
        for t in &tracks {
            t.track.push(data);
        }
        tracks.len() * data.len()
    }
}

#[async_trait]
impl MediaDevices for ScriptedDevices {
    async fn open_camera(&self, constraints: &CameraConstraints) -> Result<MediaStream, DeviceError> {
        self.camera_requests.lock().push(*constraints);
        if self.deny_camera.load(Ordering::SeqCst) {
            return Err(DeviceError::PermissionDenied("camera access was denied".to_string()));
        }
        if constraints.microphone {
            Ok(self.open(SourceKind::Camera, &[TrackKind::Video, TrackKind::Audio]))
        } else {
            Ok(self.open(SourceKind::Camera, &[TrackKind::Video]))
        }
    }

    async fn open_screen(&self, constraints: &ScreenConstraints) -> Result<MediaStream, DeviceError> {
        if self.deny_screen.load(Ordering::SeqCst) {
            return Err(DeviceError::DeviceUnavailable("no display".to_string()));
        }
        if constraints.audio {
            Ok(self.open(SourceKind::Screen, &[TrackKind::Video, TrackKind::Audio]))
        } else {
            Ok(self.open(SourceKind::Screen, &[TrackKind::Video]))
        }
    }
}

/// Sink that keeps artifacts in memory
#[derive(Default)]
pub struct MemorySink {
    pub artifacts: Mutex<Vec<RecordingArtifact>>,
    pub fail: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn deliver(&self, artifact: &RecordingArtifact) -> StudioResult<PathBuf> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StudioError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "downloads folder is read-only",
            )));
        }
        self.artifacts.lock().push(artifact.clone());
        Ok(PathBuf::from("/downloads").join(&artifact.file_name))
    }
}

/// What a [`ScriptedEncoder`] was handed
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTrack {
    pub kind: TrackKind,
    pub label: String,
    pub format: Option<TrackFormat>,
    pub bytes: Vec<u8>,
}

/// Encoder that wraps the recorded bytes in a marker instead of running
/// FFmpeg
#[derive(Default)]
pub struct ScriptedEncoder {
    pub received: Mutex<Vec<EncodedTrack>>,
    pub fail: AtomicBool,
}

impl ScriptedEncoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl MediaEncoder for ScriptedEncoder {
    async fn encode(&self, media: RecordedMedia) -> StudioResult<EncodedMedia> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StudioError::Encoding("encoder crashed".to_string()));
        }

        let mut bytes = b"WEBM".to_vec();
        let mut received = self.received.lock();
        for track in media.tracks {
            let data = track.chunks.concat();
            bytes.extend_from_slice(&data);
            received.push(EncodedTrack {
                kind: track.kind,
                label: track.label,
                format: track.format,
                bytes: data,
            });
        }

        Ok(EncodedMedia {
            bytes,
            mime_type: "video/webm",
            extension: "webm",
        })
    }
}

/// Config whose timers never fire during a test unless time is advanced
pub fn quiet_config() -> StudioConfig {
    StudioConfig {
        tick_interval_ms: 3_600_000,
        chunk_interval_ms: 3_600_000,
        ..StudioConfig::default()
    }
}

pub fn session_with(
    devices: Arc<ScriptedDevices>,
    sink: Arc<MemorySink>,
    config: StudioConfig,
) -> StudioSession {
    StudioSession::new(devices, sink, config).with_rng(StdRng::seed_from_u64(42))
}

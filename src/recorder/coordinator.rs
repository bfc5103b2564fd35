//! Studio session coordinator
//!
//! Owns the camera and screen sources, the recorder, the live session and the
//! tick task, and drives the Idle / Recording / Live state machine.
//!
//! Recording and Live exclude each other here, not just in the UI, and the
//! set of sources is frozen while either is active.

use super::clock::{SessionClock, TickReport};
use super::composite::CompositeStream;
use super::events::SessionEvent;
use super::live::{LiveDetails, LiveSession, StreamCredentials};
use super::media_recorder::{MediaRecorder, RecordedMedia};
use super::state::{LiveSummary, RecordingOutput, SessionMode, SessionSnapshot};
use super::ticker::{self, Ticker};
use crate::capture::{
    CameraConstraints, MediaDevices, MediaStream, ScreenConstraints, SourceHandle, SourceKind,
};
use crate::config::StudioConfig;
use crate::export::{ArtifactSink, MediaEncoder, RawEncoder, RecordingArtifact};
use crate::utils::{PreconditionViolation, StudioError, StudioResult};
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

/// One capture/record session, created per studio page.
///
/// Starting a recording or live session spawns timer tasks, so those calls
/// must be made from within a tokio runtime; elsewhere they fail with
/// [`StudioError::Runtime`] and leave the session unchanged.
pub struct StudioSession {
    /// Device acquisition capability
    devices: Arc<dyn MediaDevices>,

    /// Where finished recordings go
    sink: Arc<dyn ArtifactSink>,

    /// Turns recorded tracks into the downloaded file
    encoder: Arc<dyn MediaEncoder>,

    config: StudioConfig,

    camera: Option<SourceHandle>,
    screen: Option<SourceHandle>,

    /// Consulted by the next camera acquisition only
    microphone: bool,

    /// Mode and counters, shared with the tick task
    clock: Arc<Mutex<SessionClock>>,
    ticker: Ticker,

    recorder: Option<MediaRecorder>,
    live: Option<LiveSession>,

    event_tx: broadcast::Sender<SessionEvent>,
}

impl StudioSession {
    /// Create an idle session with no sources enabled
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        sink: Arc<dyn ArtifactSink>,
        config: StudioConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            devices,
            sink,
            encoder: Arc::new(RawEncoder),
            microphone: config.microphone,
            config,
            camera: None,
            screen: None,
            clock: Arc::new(Mutex::new(SessionClock::default())),
            ticker: Ticker::new(),
            recorder: None,
            live: None,
            event_tx,
        }
    }

    /// Use a specific RNG for the viewer walk
    pub fn with_rng(self, rng: StdRng) -> Self {
        *self.clock.lock() = SessionClock::new(rng);
        self
    }

    /// Use `encoder` for finished recordings instead of keeping raw bytes
    pub fn with_encoder(mut self, encoder: Arc<dyn MediaEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn mode(&self) -> SessionMode {
        self.clock.lock().mode()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.clock.lock().elapsed_secs()
    }

    pub fn viewers(&self) -> u32 {
        self.clock.lock().viewers()
    }

    pub fn is_enabled(&self, source: SourceKind) -> bool {
        self.slot(source).is_some()
    }

    pub fn microphone_enabled(&self) -> bool {
        self.microphone
    }

    /// The stream feeding a source's preview, if enabled
    pub fn preview(&self, source: SourceKind) -> Option<&MediaStream> {
        self.slot(source).as_ref().map(SourceHandle::stream)
    }

    pub fn live_session(&self) -> Option<&LiveSession> {
        self.live.as_ref()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let clock = self.clock.lock();
        SessionSnapshot {
            mode: clock.mode(),
            camera_enabled: self.camera.is_some(),
            screen_enabled: self.screen.is_some(),
            microphone_enabled: self.microphone,
            elapsed_secs: clock.elapsed_secs(),
            viewers: clock.viewers(),
            live_title: self.live.as_ref().map(|l| l.title.clone()),
            live_category: self.live.as_ref().and_then(|l| l.category.clone()),
            live_started_at: self.live.as_ref().map(|l| l.started_at),
            stream_key: self
                .live
                .as_ref()
                .map(|l| l.credentials.stream_key.clone()),
        }
    }

    fn slot(&self, source: SourceKind) -> &Option<SourceHandle> {
        match source {
            SourceKind::Camera => &self.camera,
            SourceKind::Screen => &self.screen,
        }
    }

    fn slot_mut(&mut self, source: SourceKind) -> &mut Option<SourceHandle> {
        match source {
            SourceKind::Camera => &mut self.camera,
            SourceKind::Screen => &mut self.screen,
        }
    }

    fn notify(&self, message: String) {
        let _ = self.event_tx.send(SessionEvent::Notice { message });
    }

    fn reject(&self, violation: PreconditionViolation) -> StudioError {
        tracing::warn!("Rejected: {}", violation);
        self.notify(violation.to_string());
        StudioError::Precondition(violation)
    }

    fn enabled_streams(&self) -> impl Iterator<Item = &MediaStream> {
        self.camera
            .iter()
            .chain(self.screen.iter())
            .map(SourceHandle::stream)
    }

    fn has_source(&self) -> bool {
        self.camera.is_some() || self.screen.is_some()
    }

    fn runtime(&self) -> StudioResult<Handle> {
        Handle::try_current().map_err(|e| {
            tracing::error!("Cannot start timers outside a tokio runtime: {}", e);
            StudioError::from(e)
        })
    }

    // ------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------

    /// Acquire the camera (and microphone, if toggled on)
    pub async fn enable_camera(&mut self) -> StudioResult<()> {
        self.enable(SourceKind::Camera).await
    }

    /// Stop and release the camera
    pub fn disable_camera(&mut self) -> StudioResult<()> {
        self.disable(SourceKind::Camera)
    }

    /// Acquire display capture with audio
    pub async fn enable_screen(&mut self) -> StudioResult<()> {
        self.enable(SourceKind::Screen).await
    }

    /// Stop and release display capture
    pub fn disable_screen(&mut self) -> StudioResult<()> {
        self.disable(SourceKind::Screen)
    }

    /// Flip the microphone toggle. Returns the new value.
    pub fn toggle_microphone(&mut self) -> bool {
        self.microphone = !self.microphone;
        tracing::debug!("Microphone toggle: {}", self.microphone);
        self.microphone
    }

    async fn enable(&mut self, source: SourceKind) -> StudioResult<()> {
        if self.mode().is_active() {
            return Err(self.reject(PreconditionViolation::SourcesLocked));
        }
        if self.is_enabled(source) {
            return Ok(());
        }

        let devices = self.devices.clone();
        let result = match source {
            SourceKind::Camera => {
                let constraints = CameraConstraints {
                    resolution: self.config.camera,
                    microphone: self.microphone,
                };
                devices.open_camera(&constraints).await
            }
            SourceKind::Screen => {
                let constraints = ScreenConstraints {
                    resolution: self.config.screen,
                    audio: true,
                };
                devices.open_screen(&constraints).await
            }
        };

        match result {
            Ok(stream) => {
                tracing::info!(
                    "Enabled {} ({} tracks)",
                    source,
                    stream.tracks().len()
                );
                *self.slot_mut(source) = Some(SourceHandle::new(source, stream));
                let _ = self.event_tx.send(SessionEvent::SourceEnabled { source });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to enable {}: {}", source, e);
                self.notify(format!("Could not access the {source}: {e}"));
                Err(e.into())
            }
        }
    }

    fn disable(&mut self, source: SourceKind) -> StudioResult<()> {
        if !self.is_enabled(source) {
            return Ok(());
        }
        if self.mode().is_active() {
            return Err(self.reject(PreconditionViolation::SourcesLocked));
        }

        if let Some(handle) = self.slot_mut(source).take() {
            handle.release();
        }
        tracing::info!("Disabled {}", source);
        let _ = self.event_tx.send(SessionEvent::SourceDisabled { source });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    /// Start recording every enabled source into one composite stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_recording(&mut self) -> StudioResult<()> {
        match self.mode() {
            SessionMode::Recording => return Err(self.reject(PreconditionViolation::AlreadyRecording)),
            SessionMode::Live => return Err(self.reject(PreconditionViolation::SessionBusy)),
            SessionMode::Idle => {}
        }

        let composite = CompositeStream::combine(self.enabled_streams());
        if composite.is_empty() {
            return Err(self.reject(PreconditionViolation::NoSourceEnabled));
        }
        let runtime = self.runtime()?;

        self.recorder = Some(MediaRecorder::start(
            &runtime,
            composite,
            self.config.chunk_interval(),
        ));
        self.clock.lock().begin(SessionMode::Recording);
        self.ticker.start(
            &runtime,
            self.clock.clone(),
            self.config.tick_interval(),
            self.event_tx.clone(),
        );

        tracing::info!("Recording started");
        let _ = self.event_tx.send(SessionEvent::RecordingStarted);
        Ok(())
    }

    /// Stop recording, encode and download the finished artifact.
    ///
    /// Returns `Ok(None)` when no recording was running. Sources stay enabled.
    /// If encoding or the download fails the session is still back to Idle.
    pub async fn stop_recording(&mut self) -> StudioResult<Option<RecordingOutput>> {
        if self.mode() != SessionMode::Recording {
            return Ok(None);
        }

        self.ticker.stop();
        let elapsed_secs = {
            let mut clock = self.clock.lock();
            clock.end();
            clock.elapsed_secs()
        };

        let media = match self.recorder.take() {
            Some(recorder) => recorder.stop().await,
            None => RecordedMedia::default(),
        };

        let artifact = RecordingArtifact::finalize(media, self.encoder.as_ref(), Utc::now()).await;
        let saved = match artifact {
            Ok(artifact) => self.sink.deliver(&artifact).await.map(|path| (artifact, path)),
            Err(e) => Err(e),
        };
        let (artifact, path) = match saved {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("Failed to save recording: {}", e);
                self.notify(format!("Could not save the recording: {e}"));
                return Err(e);
            }
        };

        let output = RecordingOutput {
            path: path.to_string_lossy().to_string(),
            size_bytes: artifact.size_bytes(),
            chunk_count: artifact.chunk_count,
            elapsed_secs,
        };

        tracing::info!(
            "Recording stopped after {}s: {} bytes",
            elapsed_secs,
            output.size_bytes
        );
        let _ = self.event_tx.send(SessionEvent::RecordingStopped {
            path: output.path.clone(),
            size_bytes: output.size_bytes,
        });
        Ok(Some(output))
    }

    // ------------------------------------------------------------------
    // Live
    // ------------------------------------------------------------------

    /// Go live with `title`; `category` may be blank.
    ///
    /// Credentials are only minted once every precondition holds. Must be
    /// called from within a tokio runtime.
    pub fn start_live_session(
        &mut self,
        title: &str,
        category: &str,
    ) -> StudioResult<StreamCredentials> {
        match self.mode() {
            SessionMode::Live => return Err(self.reject(PreconditionViolation::AlreadyLive)),
            SessionMode::Recording => return Err(self.reject(PreconditionViolation::SessionBusy)),
            SessionMode::Idle => {}
        }

        let details = match LiveDetails::parse(title, category) {
            Ok(details) => details,
            Err(violation) => return Err(self.reject(violation)),
        };
        if !self.has_source() {
            return Err(self.reject(PreconditionViolation::NoSourceEnabled));
        }
        let runtime = self.runtime()?;

        let credentials = StreamCredentials::mint(
            &self.config.ingest_base_url,
            self.config.watch_base_url.as_deref(),
        );
        let live = LiveSession::start(details, credentials);

        self.clock.lock().begin(SessionMode::Live);
        self.ticker.start(
            &runtime,
            self.clock.clone(),
            self.config.tick_interval(),
            self.event_tx.clone(),
        );

        let credentials = live.credentials.clone();
        tracing::info!(
            "Live session '{}' started (category: {})",
            live.title,
            live.category.as_deref().unwrap_or("none")
        );
        let _ = self.event_tx.send(SessionEvent::LiveStarted {
            title: live.title.clone(),
            stream_key: credentials.stream_key.clone(),
        });
        self.live = Some(live);
        Ok(credentials)
    }

    /// End the live session. The viewer count always returns to zero.
    pub fn stop_live_session(&mut self) -> Option<LiveSummary> {
        let was_live = self.mode() == SessionMode::Live;
        let (elapsed_secs, peak_viewers) = {
            let mut clock = self.clock.lock();
            let peak = clock.peak_viewers();
            if was_live {
                clock.end();
            }
            (clock.elapsed_secs(), peak)
        };
        if !was_live {
            return None;
        }

        self.ticker.stop();
        let live = self.live.take()?;

        tracing::info!(
            "Live session '{}' stopped after {}s, peak {} viewers",
            live.title,
            elapsed_secs,
            peak_viewers
        );
        let _ = self.event_tx.send(SessionEvent::LiveStopped { peak_viewers });
        Some(LiveSummary {
            title: live.title,
            category: live.category,
            started_at: live.started_at,
            elapsed_secs,
            peak_viewers,
        })
    }

    // ------------------------------------------------------------------
    // Timer
    // ------------------------------------------------------------------

    /// Advance the clock by one tick by hand. The tick task calls the same
    /// logic once per interval.
    pub fn tick(&mut self) -> Option<TickReport> {
        ticker::advance(&self.clock, &self.event_tx)
    }

    /// Tear everything down without saving, as when the page goes away
    pub fn shutdown(&mut self) {
        self.ticker.stop();
        if self.recorder.take().is_some() {
            tracing::warn!("Discarding in-progress recording on shutdown");
        }
        self.live = None;
        self.clock.lock().end();
        self.camera = None;
        self.screen = None;
        tracing::info!("Studio session shut down");
    }
}

impl Drop for StudioSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

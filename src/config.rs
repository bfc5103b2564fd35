//! Studio configuration
//!
//! Capture sizes, timer periods, the encoder binary and where finished
//! recordings land.

use crate::capture::Resolution;
use crate::utils::StudioResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Studio session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioConfig {
    /// Target camera capture size
    pub camera: Resolution,

    /// Display capture size
    pub screen: Resolution,

    /// Initial state of the microphone toggle
    pub microphone: bool,

    /// Period of the elapsed-time / viewer tick
    pub tick_interval_ms: u64,

    /// How often the recorder cuts a chunk from the composite stream
    pub chunk_interval_ms: u64,

    /// Where recordings are downloaded to
    pub download_dir: Option<PathBuf>,

    /// Base of the ingest URL handed out for live sessions
    pub ingest_base_url: String,

    /// Base of the public share link, if viewers have one
    pub watch_base_url: Option<String>,

    /// FFmpeg binary used to encode recordings
    pub ffmpeg_path: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            camera: Resolution::new(1280, 720),
            screen: Resolution::new(1920, 1080),
            microphone: true,
            tick_interval_ms: 1000,
            chunk_interval_ms: 1000,
            download_dir: None,
            ingest_base_url: "rtmp://stream.example.com/live".to_string(),
            watch_base_url: None,
            ffmpeg_path: PathBuf::from("ffmpeg"),
        }
    }
}

impl StudioConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist
    pub fn load(path: &Path) -> StudioResult<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: StudioConfig = serde_json::from_str(&content)?;
        tracing::info!("Loaded studio config from {:?}", path);
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_interval_ms.max(1))
    }

    pub fn download_dir_or_default(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("studio-recordings"))
    }
}

//! Finalized recordings and where they are delivered

use super::encoder::{EncodedMedia, MediaEncoder};
use crate::recorder::media_recorder::RecordedMedia;
use crate::utils::StudioResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// File name for a recording finished at `at`
pub fn artifact_file_name(at: DateTime<Utc>, extension: &str) -> String {
    format!("recording-{}.{}", at.timestamp_millis(), extension)
}

/// One finished recording, ready to download
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
    pub chunk_count: usize,
}

impl RecordingArtifact {
    pub fn new(encoded: EncodedMedia, chunk_count: usize, finished_at: DateTime<Utc>) -> Self {
        Self {
            file_name: artifact_file_name(finished_at, encoded.extension),
            bytes: encoded.bytes,
            mime_type: encoded.mime_type,
            chunk_count,
        }
    }

    /// Encode what the recorder captured into one artifact
    pub async fn finalize(
        media: RecordedMedia,
        encoder: &dyn MediaEncoder,
        finished_at: DateTime<Utc>,
    ) -> StudioResult<Self> {
        let chunk_count = media.chunk_count();
        let encoded = encoder.encode(media).await?;
        Ok(Self::new(encoded, chunk_count, finished_at))
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Receives finished recordings
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Deliver the artifact and return where it ended up
    async fn deliver(&self, artifact: &RecordingArtifact) -> StudioResult<PathBuf>;
}

/// Saves artifacts into a local downloads directory
#[derive(Debug, Clone)]
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSink for DownloadDir {
    async fn deliver(&self, artifact: &RecordingArtifact) -> StudioResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(&artifact.file_name);
        tokio::fs::write(&path, &artifact.bytes).await?;

        tracing::info!(
            "Downloaded {} ({} bytes, {}) to {:?}",
            artifact.file_name,
            artifact.size_bytes(),
            artifact.mime_type,
            path
        );
        Ok(path)
    }
}

//! Recording export
//!
//! Encodes what the recorder captured into one artifact and offers it as a
//! local download.

pub mod download;
pub mod encoder;

pub use download::{artifact_file_name, ArtifactSink, DownloadDir, RecordingArtifact};
pub use encoder::{EncodedMedia, FfmpegEncoder, MediaEncoder, RawEncoder};

//! Turning recorded tracks into a playable file
//!
//! [`FfmpegEncoder`] muxes every recorded track into one WebM file: the last
//! video track fills the frame, earlier ones are overlaid picture-in-picture
//! and all audio tracks are mixed. [`RawEncoder`] keeps the captured bytes
//! as they are and labels them accordingly.

use crate::capture::{TrackFormat, TrackKind};
use crate::recorder::media_recorder::RecordedMedia;
use crate::utils::{StudioError, StudioResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Encoded recording plus how to label it
#[derive(Debug, Clone)]
pub struct EncodedMedia {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub extension: &'static str,
}

/// Produces the downloadable file from recorded tracks
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    async fn encode(&self, media: RecordedMedia) -> StudioResult<EncodedMedia>;
}

/// Concatenates every track's chunks, track after track, with no container
#[derive(Debug, Default, Clone, Copy)]
pub struct RawEncoder;

#[async_trait]
impl MediaEncoder for RawEncoder {
    async fn encode(&self, media: RecordedMedia) -> StudioResult<EncodedMedia> {
        let mut bytes = Vec::with_capacity(media.total_bytes());
        for track in media.tracks {
            bytes.extend(track.chunks.concat());
        }

        Ok(EncodedMedia {
            bytes,
            mime_type: "application/octet-stream",
            extension: "raw",
        })
    }
}

/// One track written to disk for FFmpeg to read
#[derive(Debug, Clone)]
pub struct EncoderInput {
    pub path: PathBuf,
    pub format: TrackFormat,
}

fn input_args(input: &EncoderInput) -> Vec<String> {
    let path = input.path.to_string_lossy().to_string();
    match &input.format {
        TrackFormat::Video {
            fps, pixel_format, ..
        } if pixel_format == "mjpeg" => vec![
            "-f".into(),
            "mjpeg".into(),
            "-framerate".into(),
            fps.to_string(),
            "-i".into(),
            path,
        ],
        TrackFormat::Video {
            width,
            height,
            fps,
            pixel_format,
        } => vec![
            "-f".into(),
            "rawvideo".into(),
            "-pixel_format".into(),
            pixel_format.clone(),
            "-video_size".into(),
            format!("{width}x{height}"),
            "-framerate".into(),
            fps.to_string(),
            "-i".into(),
            path,
        ],
        TrackFormat::Audio {
            sample_rate,
            channels,
        } => vec![
            "-f".into(),
            "f32le".into(),
            "-ar".into(),
            sample_rate.to_string(),
            "-ac".into(),
            channels.to_string(),
            "-i".into(),
            path,
        ],
    }
}

/// Build the filter graph, returning it with the output labels it defines
fn build_filter_graph(
    inputs: &[EncoderInput],
) -> (String, Option<&'static str>, Option<&'static str>) {
    let videos: Vec<usize> = inputs
        .iter()
        .enumerate()
        .filter(|(_, i)| matches!(i.format, TrackFormat::Video { .. }))
        .map(|(n, _)| n)
        .collect();
    let audios: Vec<usize> = inputs
        .iter()
        .enumerate()
        .filter(|(_, i)| matches!(i.format, TrackFormat::Audio { .. }))
        .map(|(n, _)| n)
        .collect();

    let mut filters = Vec::new();

    let video_label = videos.split_last().map(|(&base, overlays)| {
        filters.push(format!("[{base}:v]format=yuv420p[base0]"));
        for (n, &overlay) in overlays.iter().enumerate() {
            let margin = 16 + n * 16;
            filters.push(format!("[{overlay}:v]scale=iw/4:-2[pip{n}]"));
            filters.push(format!(
                "[base{n}][pip{n}]overlay=W-w-{margin}:H-h-{margin}[base{}]",
                n + 1
            ));
        }
        filters.push(format!("[base{}]null[v]", overlays.len()));
        "[v]"
    });

    let audio_label = (!audios.is_empty()).then(|| {
        let sources: String = audios.iter().map(|n| format!("[{n}:a]")).collect();
        if audios.len() == 1 {
            filters.push(format!("{sources}aresample=48000[a]"));
        } else {
            filters.push(format!(
                "{sources}amix=inputs={},aresample=48000[a]",
                audios.len()
            ));
        }
        "[a]"
    });

    (filters.join(";"), video_label, audio_label)
}

/// FFmpeg arguments that encode `inputs` into a WebM file at `output`
pub fn build_ffmpeg_args(inputs: &[EncoderInput], output: &Path) -> Vec<String> {
    let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];
    for input in inputs {
        args.extend(input_args(input));
    }

    let (graph, video, audio) = build_filter_graph(inputs);
    if !graph.is_empty() {
        args.push("-filter_complex".into());
        args.push(graph);
    }

    if let Some(label) = video {
        args.extend(
            ["-map", label, "-c:v", "libvpx", "-deadline", "realtime", "-b:v", "2M"]
                .map(String::from),
        );
    }
    if let Some(label) = audio {
        args.extend(["-map", label, "-c:a", "libopus", "-b:a", "128k"].map(String::from));
    }

    args.extend(["-f", "webm"].map(String::from));
    args.push(output.to_string_lossy().to_string());
    args
}

/// Encodes recordings to WebM (VP8 + Opus) with an `ffmpeg` binary
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the configured binary runs at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn encode(&self, media: RecordedMedia) -> StudioResult<EncodedMedia> {
        let work_dir = tempfile::tempdir()?;

        let mut inputs = Vec::new();
        for (n, track) in media.tracks.into_iter().enumerate() {
            if track.chunks.is_empty() {
                continue;
            }
            let Some(format) = track.format else {
                tracing::warn!("Skipping {} track without a known format", track.label);
                continue;
            };
            let extension = match track.kind {
                TrackKind::Video => "video",
                TrackKind::Audio => "audio",
            };
            let path = work_dir.path().join(format!("track-{n}.{extension}"));
            tokio::fs::write(&path, track.chunks.concat()).await?;
            inputs.push(EncoderInput { path, format });
        }

        if inputs.is_empty() {
            return Err(StudioError::Encoding(
                "Nothing was captured to encode".to_string(),
            ));
        }

        let output_path = work_dir.path().join("recording.webm");
        let args = build_ffmpeg_args(&inputs, &output_path);
        tracing::info!("Encoding {} tracks with {:?}", inputs.len(), self.program);
        tracing::debug!("ffmpeg {}", args.join(" "));

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                StudioError::Encoding(format!("Failed to start FFmpeg ({:?}): {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(StudioError::Encoding(format!(
                "FFmpeg exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }

        let bytes = tokio::fs::read(&output_path).await?;
        tracing::info!("Encoded recording: {} bytes", bytes.len());

        Ok(EncodedMedia {
            bytes,
            mime_type: "video/webm",
            extension: "webm",
        })
    }
}

//! Native capture backend
//!
//! Camera frames come from nokhwa, microphone samples from cpal and display
//! frames from the platform's screen API.

pub mod camera;
pub mod microphone;
pub mod screen;

pub use camera::list_cameras;
pub use microphone::list_microphones;
pub use screen::list_displays;

use crate::capture::stream::{BufferedTrack, MediaStream, MediaTrack, TrackKind, TrackSource};
use crate::capture::traits::{CameraConstraints, DeviceError, MediaDevices, ScreenConstraints};
use async_trait::async_trait;
use std::sync::Arc;

/// Device backend backed by the local machine's hardware
#[derive(Debug, Default)]
pub struct NativeDevices;

impl NativeDevices {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaDevices for NativeDevices {
    async fn open_camera(&self, constraints: &CameraConstraints) -> Result<MediaStream, DeviceError> {
        let video = Arc::new(BufferedTrack::new());
        let format = camera::start_camera(constraints.resolution, video.clone()).await?;

        let mut tracks =
            vec![MediaTrack::new(TrackKind::Video, "camera", video.clone()).with_format(format)];

        if constraints.microphone {
            let audio = Arc::new(BufferedTrack::new());
            match microphone::start_microphone(audio.clone()).await {
                Ok(format) => tracks.push(
                    MediaTrack::new(TrackKind::Audio, "microphone", audio).with_format(format),
                ),
                Err(e) => {
                    // Camera and microphone are granted together or not at all
                    video.stop();
                    return Err(e);
                }
            }
        }

        Ok(MediaStream::new(tracks))
    }

    async fn open_screen(&self, constraints: &ScreenConstraints) -> Result<MediaStream, DeviceError> {
        let video = Arc::new(BufferedTrack::new());
        let format = screen::start_screen(constraints.resolution, video.clone()).await?;

        let mut tracks =
            vec![MediaTrack::new(TrackKind::Video, "screen", video).with_format(format)];

        if constraints.audio {
            let audio = Arc::new(BufferedTrack::new());
            match screen::start_system_audio(audio.clone()).await {
                Ok(format) => tracks.push(
                    MediaTrack::new(TrackKind::Audio, "system audio", audio).with_format(format),
                ),
                // Display capture without sound is still useful
                Err(e) => {
                    audio.stop();
                    tracing::warn!("Screen captured without audio: {}", e);
                }
            }
        }

        Ok(MediaStream::new(tracks))
    }
}

//! Webcam capture using nokhwa
//!
//! The camera is opened and pumped on a dedicated thread; raw frame buffers
//! are pushed into the track until it is stopped.

use crate::capture::stream::{BufferedTrack, TrackFormat, TrackSource};
use crate::capture::traits::{CameraInfo, DeviceError, Resolution};
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};
use nokhwa::{Camera, NokhwaError};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Get list of available cameras
pub fn list_cameras() -> Vec<CameraInfo> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => cameras
            .into_iter()
            .map(|info| {
                let id = match info.index() {
                    CameraIndex::Index(i) => i.to_string(),
                    CameraIndex::String(s) => s.to_string(),
                };
                CameraInfo {
                    id,
                    name: info.human_name().to_string(),
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate cameras: {:?}", e);
            Vec::new()
        }
    }
}

fn map_error(error: NokhwaError) -> DeviceError {
    let message = error.to_string();
    if message.to_lowercase().contains("permission") {
        DeviceError::PermissionDenied(message)
    } else {
        DeviceError::DeviceUnavailable(message)
    }
}

/// FFmpeg name of the camera's native frame layout
fn ffmpeg_pixel_format(format: FrameFormat) -> &'static str {
    match format {
        FrameFormat::YUYV => "yuyv422",
        FrameFormat::NV12 => "nv12",
        FrameFormat::RAWRGB => "rgb24",
        FrameFormat::MJPEG => "mjpeg",
        other => {
            tracing::warn!("Unknown camera format {:?}, falling back to yuyv422", other);
            "yuyv422"
        }
    }
}

/// Open the default camera and start pumping frames into `track`.
///
/// Resolves with the layout of the frames once the device is streaming, or
/// with the reason it could not be opened.
pub async fn start_camera(
    resolution: Resolution,
    track: Arc<BufferedTrack>,
) -> Result<TrackFormat, DeviceError> {
    let (ready_tx, ready_rx) = oneshot::channel();

    std::thread::Builder::new()
        .name("camera-capture".to_string())
        .spawn(move || {
            let format = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::HighestResolution(
                nokhwa::utils::Resolution::new(resolution.width, resolution.height),
            ));

            let mut camera = match Camera::new(CameraIndex::Index(0), format) {
                Ok(c) => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(map_error(e)));
                    return;
                }
            };

            if let Err(e) = camera.open_stream() {
                let _ = ready_tx.send(Err(map_error(e)));
                return;
            }

            let actual = camera.camera_format();
            let pixel_format = ffmpeg_pixel_format(actual.format());
            tracing::info!(
                "Camera opened: {}x{} @ {}fps, {} (requested {}x{})",
                actual.resolution().width(),
                actual.resolution().height(),
                actual.frame_rate(),
                pixel_format,
                resolution.width,
                resolution.height
            );
            let _ = ready_tx.send(Ok(TrackFormat::Video {
                width: actual.resolution().width(),
                height: actual.resolution().height(),
                fps: actual.frame_rate(),
                pixel_format: pixel_format.to_string(),
            }));

            let mut frame_count: u64 = 0;
            while track.is_live() {
                // Blocks until the camera delivers the next frame
                match camera.frame() {
                    Ok(frame) => {
                        if !track.push(frame.buffer()) {
                            break;
                        }
                        frame_count += 1;
                    }
                    Err(e) => {
                        tracing::debug!("Failed to capture frame: {:?}", e);
                    }
                }
            }

            if let Err(e) = camera.stop_stream() {
                tracing::warn!("Error stopping camera stream: {:?}", e);
            }
            tracing::info!("Camera capture thread stopped after {} frames", frame_count);
        })
        .map_err(|e| DeviceError::Backend(format!("Failed to spawn camera thread: {e}")))?;

    ready_rx
        .await
        .map_err(|_| DeviceError::Backend("Camera thread exited before opening".to_string()))?
}

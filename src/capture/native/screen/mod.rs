//! Display capture
//!
//! Grabs the primary display at a fixed rate on a dedicated thread and pushes
//! tightly packed BGRA frames into the track. macOS uses CoreGraphics and
//! Windows uses GDI; other targets report the display as unavailable.

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as platform;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use self::windows as platform;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
mod unsupported;
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
use unsupported as platform;

use crate::capture::stream::{BufferedTrack, TrackFormat, TrackSource};
use crate::capture::traits::{DeviceError, DisplayInfo, Resolution};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Display grab rate
pub const SCREEN_FPS: u32 = 15;

/// One grabbed display image, BGRA with no row padding
#[derive(Debug)]
#[cfg_attr(not(any(target_os = "macos", target_os = "windows")), allow(dead_code))]
pub(crate) struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Get list of available displays
pub fn list_displays() -> Vec<DisplayInfo> {
    platform::list_displays()
}

/// Copy `height` rows of `width` BGRA pixels out of a buffer whose rows are
/// `stride` bytes apart. Returns `None` if the buffer is too short.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn pack_rows(bytes: &[u8], stride: usize, width: u32, height: u32) -> Option<Vec<u8>> {
    let row = width as usize * 4;
    if stride < row {
        return None;
    }

    let mut packed = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        packed.extend_from_slice(bytes.get(start..start + row)?);
    }
    Some(packed)
}

/// Start grabbing the primary display into `track`.
///
/// Resolves with the frame layout once the first frame was captured, or with
/// the reason the display could not be opened.
pub async fn start_screen(
    resolution: Resolution,
    track: Arc<BufferedTrack>,
) -> Result<TrackFormat, DeviceError> {
    let (ready_tx, ready_rx) = oneshot::channel();

    std::thread::Builder::new()
        .name("screen-capture".to_string())
        .spawn(move || {
            if let Err(e) = platform::ensure_access() {
                let _ = ready_tx.send(Err(e));
                return;
            }

            let first = match platform::grab_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let (width, height) = (first.width, first.height);

            tracing::info!(
                "Display capture opened: {}x{} @ {}fps (requested {}x{})",
                width,
                height,
                SCREEN_FPS,
                resolution.width,
                resolution.height
            );
            let _ = ready_tx.send(Ok(TrackFormat::Video {
                width,
                height,
                fps: SCREEN_FPS,
                pixel_format: "bgra".to_string(),
            }));
            track.push(&first.data);

            let frame_interval = Duration::from_millis(1000 / SCREEN_FPS as u64);
            let mut frame_count: u64 = 1;

            while track.is_live() {
                let started = Instant::now();

                match platform::grab_frame() {
                    Ok(frame) if frame.width == width && frame.height == height => {
                        if !track.push(&frame.data) {
                            break;
                        }
                        frame_count += 1;
                    }
                    Ok(frame) => {
                        tracing::debug!(
                            "Skipping {}x{} frame, display is recording at {}x{}",
                            frame.width,
                            frame.height,
                            width,
                            height
                        );
                    }
                    Err(e) => tracing::debug!("Failed to capture display frame: {}", e),
                }

                let elapsed = started.elapsed();
                if elapsed < frame_interval {
                    std::thread::sleep(frame_interval - elapsed);
                }
            }

            tracing::info!("Display capture thread stopped after {} frames", frame_count);
        })
        .map_err(|e| DeviceError::Backend(format!("Failed to spawn display thread: {e}")))?;

    ready_rx
        .await
        .map_err(|_| DeviceError::Backend("Display thread exited before opening".to_string()))?
}

/// Start capturing what the machine is playing into `track`
#[cfg(target_os = "windows")]
pub async fn start_system_audio(track: Arc<BufferedTrack>) -> Result<TrackFormat, DeviceError> {
    super::microphone::start_audio(super::microphone::AudioInput::SystemLoopback, track).await
}

/// Start capturing what the machine is playing into `track`
#[cfg(not(target_os = "windows"))]
pub async fn start_system_audio(_track: Arc<BufferedTrack>) -> Result<TrackFormat, DeviceError> {
    Err(DeviceError::DeviceUnavailable(
        "System audio capture is not supported on this platform".to_string(),
    ))
}

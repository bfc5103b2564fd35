//! Audio capture using cpal
//!
//! Covers the microphone and, on Windows, system audio through WASAPI
//! loopback on the default output device.

use crate::capture::stream::{BufferedTrack, TrackFormat, TrackSource};
use crate::capture::traits::{AudioDeviceInfo, DeviceError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SupportedStreamConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Which audio the capture thread listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioInput {
    /// Default input device
    Microphone,
    /// What the default output device is playing
    #[cfg(target_os = "windows")]
    SystemLoopback,
}

impl AudioInput {
    fn label(self) -> &'static str {
        match self {
            AudioInput::Microphone => "Microphone",
            #[cfg(target_os = "windows")]
            AudioInput::SystemLoopback => "System audio",
        }
    }

    fn open(self, host: &cpal::Host) -> Result<(Device, SupportedStreamConfig), DeviceError> {
        let device = match self {
            AudioInput::Microphone => host.default_input_device(),
            #[cfg(target_os = "windows")]
            AudioInput::SystemLoopback => host.default_output_device(),
        }
        .ok_or_else(|| DeviceError::DeviceUnavailable(format!("No {} device found", self.label())))?;

        let config = match self {
            AudioInput::Microphone => device.default_input_config(),
            #[cfg(target_os = "windows")]
            AudioInput::SystemLoopback => device.default_output_config(),
        }
        .map_err(|e| DeviceError::PermissionDenied(e.to_string()))?;

        Ok((device, config))
    }
}

/// Get list of available audio input devices
pub fn list_microphones() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok());

    match host.input_devices() {
        Ok(devices) => devices
            .filter_map(|device| device.name().ok())
            .map(|name| AudioDeviceInfo {
                id: name.clone(),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate audio input devices: {}", e);
            Vec::new()
        }
    }
}

/// Open the default microphone and push little-endian f32 samples into
/// `track` until it is stopped.
pub async fn start_microphone(track: Arc<BufferedTrack>) -> Result<TrackFormat, DeviceError> {
    start_audio(AudioInput::Microphone, track).await
}

/// Open `input` and push little-endian f32 samples into `track` until it is
/// stopped. Resolves with the sample layout once audio is flowing.
pub async fn start_audio(
    input: AudioInput,
    track: Arc<BufferedTrack>,
) -> Result<TrackFormat, DeviceError> {
    let (ready_tx, ready_rx) = oneshot::channel();

    // cpal streams are not Send, so the stream lives and dies on this thread
    std::thread::Builder::new()
        .name("audio-capture".to_string())
        .spawn(move || {
            let host = cpal::default_host();
            let (device, supported) = match input.open(&host) {
                Ok(opened) => opened,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            if supported.sample_format() != SampleFormat::F32 {
                let _ = ready_tx.send(Err(DeviceError::Backend(format!(
                    "Unsupported {} sample format {:?}",
                    input.label(),
                    supported.sample_format()
                ))));
                return;
            }

            let config = supported.config();
            let sink = track.clone();
            let stream = device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let bytes: Vec<u8> = data
                        .iter()
                        .flat_map(|&sample| sample.to_le_bytes())
                        .collect();
                    sink.push(&bytes);
                },
                move |err| tracing::error!("{} stream error: {}", input.label(), err),
                None,
            );

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(DeviceError::Backend(e.to_string())));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(DeviceError::Backend(e.to_string())));
                return;
            }

            tracing::info!(
                "{} opened: {} Hz, {} channels",
                input.label(),
                config.sample_rate.0,
                config.channels
            );
            let _ = ready_tx.send(Ok(TrackFormat::Audio {
                sample_rate: config.sample_rate.0,
                channels: config.channels,
            }));

            while track.is_live() {
                std::thread::sleep(Duration::from_millis(100));
            }

            drop(stream);
            tracing::info!("{} capture thread stopped", input.label());
        })
        .map_err(|e| DeviceError::Backend(format!("Failed to spawn audio thread: {e}")))?;

    ready_rx
        .await
        .map_err(|_| DeviceError::Backend("Audio thread exited before opening".to_string()))?
}

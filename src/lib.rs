//! Studio session - camera and screen capture, recording and live sessions.
//!
//! The core library manages one capture/record session. The `desktop`
//! feature adds the Tauri shell that exposes it to the studio webview.

pub mod capture;
pub mod config;
pub mod export;
pub mod recorder;
pub mod utils;

#[cfg(feature = "desktop")]
pub mod commands;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use crate::capture::native::NativeDevices;
    use crate::commands::studio::StudioState;
    use crate::config::StudioConfig;
    use crate::export::{DownloadDir, FfmpegEncoder, MediaEncoder, RawEncoder};
    use crate::recorder::StudioSession;
    use anyhow::Context;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tauri::{Emitter, Manager};
    use tokio::sync::broadcast::error::RecvError;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    fn load_config() -> anyhow::Result<StudioConfig> {
        match std::env::var_os("STUDIO_CONFIG") {
            Some(path) => {
                let path = PathBuf::from(path);
                StudioConfig::load(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            }
            None => Ok(StudioConfig::default()),
        }
    }

    /// Initialize the application
    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        // Initialize tracing/logging
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "studio_session=debug,tauri=info".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();

        tracing::info!("Starting studio v{}", env!("CARGO_PKG_VERSION"));

        tauri::Builder::default()
            .plugin(tauri_plugin_shell::init())
            .plugin(tauri_plugin_dialog::init())
            .plugin(tauri_plugin_fs::init())
            .invoke_handler(tauri::generate_handler![
                crate::commands::studio::get_cameras,
                crate::commands::studio::get_audio_devices,
                crate::commands::studio::get_displays,
                crate::commands::studio::get_session_snapshot,
                crate::commands::studio::enable_camera,
                crate::commands::studio::disable_camera,
                crate::commands::studio::enable_screen,
                crate::commands::studio::disable_screen,
                crate::commands::studio::toggle_microphone,
                crate::commands::studio::start_recording,
                crate::commands::studio::stop_recording,
                crate::commands::studio::start_live_session,
                crate::commands::studio::stop_live_session,
                crate::commands::studio::is_source_enabled,
            ])
            .setup(|app| {
                let mut config = load_config()?;
                if config.download_dir.is_none() {
                    config.download_dir = app.path().download_dir().ok();
                }

                let ffmpeg = FfmpegEncoder::new(config.ffmpeg_path.clone());
                let encoder: Arc<dyn MediaEncoder> = if ffmpeg.is_available() {
                    Arc::new(ffmpeg)
                } else {
                    tracing::warn!(
                        "FFmpeg not found at {:?}; recordings are saved as raw capture data",
                        config.ffmpeg_path
                    );
                    Arc::new(RawEncoder)
                };

                let sink = DownloadDir::new(config.download_dir_or_default());
                let session = StudioSession::new(Arc::new(NativeDevices::new()), Arc::new(sink), config)
                    .with_encoder(encoder);

                // Forward session events to the webview
                let mut events = session.subscribe();
                let handle = app.handle().clone();
                tauri::async_runtime::spawn(async move {
                    loop {
                        match events.recv().await {
                            Ok(event) => {
                                if let Err(e) = handle.emit("studio://event", &event) {
                                    tracing::warn!("Failed to emit session event: {}", e);
                                }
                            }
                            Err(RecvError::Lagged(skipped)) => {
                                tracing::warn!("Dropped {} session events", skipped);
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                });

                app.manage(StudioState::new(session));
                Ok(())
            })
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}

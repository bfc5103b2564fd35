//! Studio session Tauri commands

use crate::capture::native::{list_cameras, list_displays, list_microphones};
use crate::capture::{AudioDeviceInfo, CameraInfo, DisplayInfo, SourceKind};
use crate::recorder::{
    LiveSummary, RecordingOutput, SessionSnapshot, StreamCredentials, StudioSession,
};
use crate::utils::ErrorResponse;
use std::sync::Arc;
use tauri::State;
use tokio::sync::Mutex;

/// Application state holding the page's capture session
pub struct StudioState {
    pub session: Arc<Mutex<StudioSession>>,
}

impl StudioState {
    pub fn new(session: StudioSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

/// Get list of available cameras
#[tauri::command]
pub async fn get_cameras() -> Result<Vec<CameraInfo>, String> {
    Ok(list_cameras())
}

/// Get list of available audio input devices (microphones)
#[tauri::command]
pub async fn get_audio_devices() -> Result<Vec<AudioDeviceInfo>, String> {
    Ok(list_microphones())
}

/// Get list of available displays
#[tauri::command]
pub async fn get_displays() -> Result<Vec<DisplayInfo>, String> {
    Ok(list_displays())
}

/// Current session state
#[tauri::command]
pub async fn get_session_snapshot(
    state: State<'_, StudioState>,
) -> Result<SessionSnapshot, ErrorResponse> {
    let session = state.session.lock().await;
    Ok(session.snapshot())
}

/// Enable the camera (and microphone, if toggled on)
#[tauri::command]
pub async fn enable_camera(
    state: State<'_, StudioState>,
) -> Result<SessionSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.enable_camera().await?;
    Ok(session.snapshot())
}

/// Disable the camera
#[tauri::command]
pub async fn disable_camera(
    state: State<'_, StudioState>,
) -> Result<SessionSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.disable_camera()?;
    Ok(session.snapshot())
}

/// Enable screen capture
#[tauri::command]
pub async fn enable_screen(
    state: State<'_, StudioState>,
) -> Result<SessionSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.enable_screen().await?;
    Ok(session.snapshot())
}

/// Disable screen capture
#[tauri::command]
pub async fn disable_screen(
    state: State<'_, StudioState>,
) -> Result<SessionSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.disable_screen()?;
    Ok(session.snapshot())
}

/// Flip the microphone toggle used by the next camera acquisition
#[tauri::command]
pub async fn toggle_microphone(state: State<'_, StudioState>) -> Result<bool, ErrorResponse> {
    let mut session = state.session.lock().await;
    Ok(session.toggle_microphone())
}

/// Start recording the enabled sources
#[tauri::command]
pub async fn start_recording(
    state: State<'_, StudioState>,
) -> Result<SessionSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.start_recording()?;
    Ok(session.snapshot())
}

/// Stop recording and download the result
#[tauri::command]
pub async fn stop_recording(
    state: State<'_, StudioState>,
) -> Result<Option<RecordingOutput>, ErrorResponse> {
    let mut session = state.session.lock().await;
    Ok(session.stop_recording().await?)
}

/// Go live
#[tauri::command]
pub async fn start_live_session(
    state: State<'_, StudioState>,
    title: String,
    category: Option<String>,
) -> Result<StreamCredentials, ErrorResponse> {
    let mut session = state.session.lock().await;
    Ok(session.start_live_session(&title, category.as_deref().unwrap_or(""))?)
}

/// End the live session
#[tauri::command]
pub async fn stop_live_session(
    state: State<'_, StudioState>,
) -> Result<Option<LiveSummary>, ErrorResponse> {
    let mut session = state.session.lock().await;
    Ok(session.stop_live_session())
}

/// Whether a source is currently enabled
#[tauri::command]
pub async fn is_source_enabled(
    state: State<'_, StudioState>,
    source: SourceKind,
) -> Result<bool, ErrorResponse> {
    let session = state.session.lock().await;
    Ok(session.is_enabled(source))
}

mod common;

use common::{quiet_config, session_with, MemorySink, ScriptedDevices, ScriptedEncoder};
use std::sync::atomic::Ordering;
use studio_session::capture::{DeviceError, SourceKind, TrackFormat, TrackKind};
use studio_session::recorder::{SessionEvent, SessionMode};
use studio_session::utils::{PreconditionViolation, StudioError};

fn assert_precondition(result: Result<impl std::fmt::Debug, StudioError>, expected: PreconditionViolation) {
    match result {
        Err(StudioError::Precondition(v)) => assert_eq!(v, expected),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

fn drain_notices(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<String> {
    let mut notices = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::Notice { message } = event {
            notices.push(message);
        }
    }
    notices
}

#[tokio::test]
async fn test_camera_toggle_sequence_keeps_one_stream() {
    let devices = ScriptedDevices::new();
    let mut session = session_with(devices.clone(), MemorySink::new(), quiet_config());

    session.enable_camera().await.unwrap();
    session.enable_camera().await.unwrap();
    assert!(session.is_enabled(SourceKind::Camera));
    assert_eq!(devices.camera_requests.lock().len(), 1);

    session.disable_camera().unwrap();
    session.disable_camera().unwrap();
    assert!(!session.is_enabled(SourceKind::Camera));

    session.enable_camera().await.unwrap();
    session.disable_camera().unwrap();
    session.enable_camera().await.unwrap();
    assert!(session.is_enabled(SourceKind::Camera));

    let live_video: Vec<_> = devices
        .live_tracks(SourceKind::Camera)
        .into_iter()
        .filter(|t| t.kind == TrackKind::Video)
        .collect();
    assert_eq!(live_video.len(), 1);
}

#[tokio::test]
async fn test_disabling_source_stops_its_tracks() {
    let devices = ScriptedDevices::new();
    let mut session = session_with(devices.clone(), MemorySink::new(), quiet_config());

    session.enable_screen().await.unwrap();
    assert_eq!(devices.live_tracks(SourceKind::Screen).len(), 2);
    assert!(session.preview(SourceKind::Screen).is_some());

    session.disable_screen().unwrap();
    assert!(devices.live_tracks(SourceKind::Screen).is_empty());
    assert!(session.preview(SourceKind::Screen).is_none());
}

#[tokio::test]
async fn test_denied_camera_leaves_state_disabled() {
    let devices = ScriptedDevices::new();
    devices.deny_camera.store(true, Ordering::SeqCst);
    let mut session = session_with(devices.clone(), MemorySink::new(), quiet_config());
    let mut events = session.subscribe();

    let result = session.enable_camera().await;
    assert!(matches!(
        result,
        Err(StudioError::Device(DeviceError::PermissionDenied(_)))
    ));
    assert!(!session.is_enabled(SourceKind::Camera));
    assert_eq!(session.mode(), SessionMode::Idle);

    let notices = drain_notices(&mut events);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("camera"));

    // No automatic retry
    assert_eq!(devices.camera_requests.lock().len(), 1);
}

#[tokio::test]
async fn test_microphone_toggle_applies_to_next_acquisition() {
    let devices = ScriptedDevices::new();
    let mut session = session_with(devices.clone(), MemorySink::new(), quiet_config());
    assert!(session.microphone_enabled());

    session.enable_camera().await.unwrap();
    assert_eq!(devices.live_tracks(SourceKind::Camera).len(), 2);

    assert!(!session.toggle_microphone());
    // The open stream keeps its audio track
    assert_eq!(devices.live_tracks(SourceKind::Camera).len(), 2);

    session.disable_camera().unwrap();
    session.enable_camera().await.unwrap();
    let requests = devices.camera_requests.lock().clone();
    assert!(requests[0].microphone);
    assert!(!requests[1].microphone);
    assert_eq!(devices.live_tracks(SourceKind::Camera).len(), 1);
}

#[tokio::test]
async fn test_start_recording_without_source_fails() {
    let sink = MemorySink::new();
    let mut session = session_with(ScriptedDevices::new(), sink.clone(), quiet_config());
    let mut events = session.subscribe();

    assert_precondition(session.start_recording(), PreconditionViolation::NoSourceEnabled);
    assert_eq!(session.mode(), SessionMode::Idle);
    assert!(!session.is_ticking());
    assert_eq!(drain_notices(&mut events).len(), 1);

    assert!(session.stop_recording().await.unwrap().is_none());
    assert!(sink.artifacts.lock().is_empty());
}

#[tokio::test]
async fn test_recording_produces_one_artifact_without_loss() {
    let devices = ScriptedDevices::new();
    let sink = MemorySink::new();
    let mut session = session_with(devices.clone(), sink.clone(), quiet_config());

    session.enable_camera().await.unwrap();
    // Preview data before the recording starts is not recorded
    devices.feed(SourceKind::Camera, b"preview");

    session.tick();
    session.start_recording().unwrap();
    assert_eq!(session.mode(), SessionMode::Recording);
    assert_eq!(session.elapsed_secs(), 0);
    assert!(session.is_ticking());

    let mut pushed = devices.feed(SourceKind::Camera, b"frame-1");
    pushed += devices.feed(SourceKind::Camera, b"frame-2");

    let output = session.stop_recording().await.unwrap().unwrap();
    assert_eq!(session.mode(), SessionMode::Idle);
    assert!(!session.is_ticking());

    let artifacts = sink.artifacts.lock();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].bytes.len() >= pushed);
    assert_eq!(output.size_bytes, artifacts[0].bytes.len() as u64);
    // Without an encoder the bytes are kept as captured and labelled as such
    assert!(output.path.ends_with(".raw"));
    assert_eq!(artifacts[0].mime_type, "application/octet-stream");
    assert!(artifacts[0].file_name.starts_with("recording-"));
}

#[tokio::test]
async fn test_recording_is_encoded_per_track() {
    let devices = ScriptedDevices::new();
    let sink = MemorySink::new();
    let encoder = ScriptedEncoder::new();
    let mut session =
        session_with(devices.clone(), sink.clone(), quiet_config()).with_encoder(encoder.clone());

    session.enable_camera().await.unwrap();
    session.enable_screen().await.unwrap();
    session.start_recording().unwrap();
    devices.feed(SourceKind::Camera, b"cam");
    devices.feed(SourceKind::Screen, b"screen");

    let output = session.stop_recording().await.unwrap().unwrap();
    assert!(output.path.ends_with(".webm"));

    let artifacts = sink.artifacts.lock();
    assert_eq!(artifacts[0].mime_type, "video/webm");
    assert!(artifacts[0].bytes.starts_with(b"WEBM"));

    // Camera video + microphone, then screen video + system audio
    let received = encoder.received.lock();
    assert_eq!(received.len(), 4);
    assert_eq!(received[0].kind, TrackKind::Video);
    assert_eq!(received[0].bytes, b"cam".to_vec());
    assert_eq!(received[2].bytes, b"screen".to_vec());
    assert!(matches!(
        received[1].format,
        Some(TrackFormat::Audio { sample_rate: 48_000, .. })
    ));
}

#[tokio::test]
async fn test_failed_encoding_still_returns_to_idle() {
    let sink = MemorySink::new();
    let encoder = ScriptedEncoder::new();
    encoder.fail.store(true, Ordering::SeqCst);
    let mut session =
        session_with(ScriptedDevices::new(), sink.clone(), quiet_config()).with_encoder(encoder);
    let mut events = session.subscribe();

    session.enable_camera().await.unwrap();
    session.start_recording().unwrap();
    assert!(matches!(session.stop_recording().await, Err(StudioError::Encoding(_))));
    assert_eq!(session.mode(), SessionMode::Idle);
    assert!(sink.artifacts.lock().is_empty());
    assert_eq!(drain_notices(&mut events).len(), 1);
}

#[test]
fn test_starting_outside_a_runtime_is_an_error() {
    let devices = ScriptedDevices::new();
    let mut session = session_with(devices.clone(), MemorySink::new(), quiet_config());
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(session.enable_camera()).unwrap();

    assert!(matches!(session.start_recording(), Err(StudioError::Runtime(_))));
    assert!(matches!(
        session.start_live_session("Offline", ""),
        Err(StudioError::Runtime(_))
    ));
    assert_eq!(session.mode(), SessionMode::Idle);
    assert!(session.live_session().is_none());
    assert!(!session.is_ticking());

    // Nothing was attached, so the camera still only previews
    assert!(devices
        .live_tracks(SourceKind::Camera)
        .iter()
        .all(|t| !t.track.is_attached()));
}

#[tokio::test]
async fn test_record_camera_and_screen_for_five_ticks() {
    let devices = ScriptedDevices::new();
    let sink = MemorySink::new();
    let mut session = session_with(devices.clone(), sink.clone(), quiet_config());

    session.enable_camera().await.unwrap();
    session.enable_screen().await.unwrap();
    session.start_recording().unwrap();

    let mut pushed = 0;
    for i in 0..5 {
        pushed += devices.feed(SourceKind::Camera, format!("cam{i}").as_bytes());
        pushed += devices.feed(SourceKind::Screen, format!("scr{i}").as_bytes());
        session.tick();
    }
    assert_eq!(session.elapsed_secs(), 5);

    let output = session.stop_recording().await.unwrap().unwrap();
    assert_eq!(output.elapsed_secs, 5);
    assert_eq!(session.mode(), SessionMode::Idle);
    assert_eq!(sink.artifacts.lock().len(), 1);
    assert_eq!(output.size_bytes as usize, pushed);

    // Sources stay enabled; disabling them is a separate action
    assert!(session.is_enabled(SourceKind::Camera));
    assert!(session.is_enabled(SourceKind::Screen));
    assert_eq!(devices.live_tracks(SourceKind::Camera).len(), 2);
    assert_eq!(devices.live_tracks(SourceKind::Screen).len(), 2);
}

#[tokio::test]
async fn test_second_start_recording_is_rejected() {
    let mut session = session_with(ScriptedDevices::new(), MemorySink::new(), quiet_config());
    session.enable_camera().await.unwrap();
    session.start_recording().unwrap();
    session.tick();

    assert_precondition(session.start_recording(), PreconditionViolation::AlreadyRecording);
    assert_eq!(session.mode(), SessionMode::Recording);
    assert_eq!(session.elapsed_secs(), 1);
}

#[tokio::test]
async fn test_failed_download_still_returns_to_idle() {
    let sink = MemorySink::new();
    sink.fail.store(true, Ordering::SeqCst);
    let mut session = session_with(ScriptedDevices::new(), sink.clone(), quiet_config());
    let mut events = session.subscribe();

    session.enable_camera().await.unwrap();
    session.start_recording().unwrap();
    assert!(matches!(session.stop_recording().await, Err(StudioError::Io(_))));
    assert_eq!(session.mode(), SessionMode::Idle);
    assert_eq!(drain_notices(&mut events).len(), 1);
}

#[tokio::test]
async fn test_live_requires_title() {
    let mut session = session_with(ScriptedDevices::new(), MemorySink::new(), quiet_config());
    session.enable_camera().await.unwrap();

    assert_precondition(session.start_live_session("", ""), PreconditionViolation::EmptyTitle);
    assert_precondition(session.start_live_session("   ", "Music"), PreconditionViolation::EmptyTitle);
    assert_eq!(session.mode(), SessionMode::Idle);
    assert!(session.live_session().is_none());
}

#[tokio::test]
async fn test_rejected_live_start_hands_out_nothing() {
    let mut session = session_with(ScriptedDevices::new(), MemorySink::new(), quiet_config());
    let mut events = session.subscribe();

    assert!(session.start_live_session("", "").is_err());
    assert!(session.start_live_session("No sources", "").is_err());

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|e| matches!(e, SessionEvent::Notice { .. })));

    let snapshot = session.snapshot();
    assert!(snapshot.stream_key.is_none());
    assert!(snapshot.live_started_at.is_none());
}

#[tokio::test]
async fn test_live_requires_source() {
    let mut session = session_with(ScriptedDevices::new(), MemorySink::new(), quiet_config());
    assert_precondition(
        session.start_live_session("My Stream", ""),
        PreconditionViolation::NoSourceEnabled,
    );
    assert_eq!(session.mode(), SessionMode::Idle);
}

#[tokio::test]
async fn test_live_session_lifecycle() {
    let mut session = session_with(ScriptedDevices::new(), MemorySink::new(), quiet_config());
    session.enable_screen().await.unwrap();

    let credentials = session.start_live_session("My Stream", "").unwrap();
    assert_eq!(session.mode(), SessionMode::Live);
    assert_eq!(session.viewers(), 1);
    assert_eq!(session.elapsed_secs(), 0);
    assert!(credentials.ingest_url.ends_with(&credentials.stream_key));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.live_title.as_deref(), Some("My Stream"));
    assert!(snapshot.live_category.is_none());
    assert_eq!(snapshot.stream_key.as_deref(), Some(credentials.stream_key.as_str()));
    let started_at = snapshot.live_started_at.unwrap();

    let mut peak = 1;
    for _ in 0..100 {
        let report = session.tick().unwrap();
        peak = peak.max(report.viewers);
    }
    assert_eq!(session.elapsed_secs(), 100);

    let summary = session.stop_live_session().unwrap();
    assert_eq!(summary.title, "My Stream");
    assert_eq!(summary.started_at, started_at);
    assert_eq!(summary.elapsed_secs, 100);
    assert_eq!(summary.peak_viewers, peak);
    assert_eq!(session.mode(), SessionMode::Idle);
    assert_eq!(session.viewers(), 0);
    assert!(!session.is_ticking());
    assert!(session.stop_live_session().is_none());
    assert_eq!(session.viewers(), 0);
}

#[tokio::test]
async fn test_recording_and_live_exclude_each_other() {
    let mut session = session_with(ScriptedDevices::new(), MemorySink::new(), quiet_config());
    session.enable_camera().await.unwrap();

    session.start_recording().unwrap();
    assert_precondition(session.start_live_session("Show", "Talk"), PreconditionViolation::SessionBusy);
    assert_eq!(session.mode(), SessionMode::Recording);
    assert!(session.stop_live_session().is_none());
    assert_eq!(session.mode(), SessionMode::Recording);
    session.stop_recording().await.unwrap();

    session.start_live_session("Show", "Talk").unwrap();
    assert_precondition(session.start_recording(), PreconditionViolation::SessionBusy);
    assert_precondition(session.start_live_session("Again", ""), PreconditionViolation::AlreadyLive);
    assert_eq!(session.mode(), SessionMode::Live);
    assert!(session.stop_recording().await.unwrap().is_none());
    assert_eq!(session.live_session().unwrap().category.as_deref(), Some("Talk"));
}

#[tokio::test]
async fn test_sources_are_locked_while_active() {
    let devices = ScriptedDevices::new();
    let mut session = session_with(devices.clone(), MemorySink::new(), quiet_config());
    session.enable_camera().await.unwrap();
    session.start_live_session("Locked", "").unwrap();

    assert_precondition(session.disable_camera(), PreconditionViolation::SourcesLocked);
    assert_precondition(session.enable_screen().await, PreconditionViolation::SourcesLocked);
    assert!(session.is_enabled(SourceKind::Camera));
    assert!(!session.is_enabled(SourceKind::Screen));

    // Nothing to release, so this is still a no-op
    session.disable_screen().unwrap();

    session.stop_live_session();
    session.disable_camera().unwrap();
    assert!(devices.all_stopped());
}

#[tokio::test]
async fn test_dropping_session_releases_devices() {
    let devices = ScriptedDevices::new();
    let mut session = session_with(devices.clone(), MemorySink::new(), quiet_config());
    session.enable_camera().await.unwrap();
    session.enable_screen().await.unwrap();
    session.start_recording().unwrap();
    devices.feed(SourceKind::Camera, b"unsaved");

    drop(session);
    assert!(devices.all_stopped());
}

#[tokio::test]
async fn test_events_follow_lifecycle() {
    let mut session = session_with(ScriptedDevices::new(), MemorySink::new(), quiet_config());
    let mut events = session.subscribe();

    session.enable_camera().await.unwrap();
    session.start_recording().unwrap();
    session.tick();
    session.stop_recording().await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen[0],
        SessionEvent::SourceEnabled {
            source: SourceKind::Camera
        }
    );
    assert_eq!(seen[1], SessionEvent::RecordingStarted);
    assert_eq!(
        seen[2],
        SessionEvent::Tick {
            elapsed_secs: 1,
            viewers: 0
        }
    );
    assert!(matches!(seen[3], SessionEvent::RecordingStopped { .. }));

    let json = serde_json::to_value(&seen[2]).unwrap();
    assert_eq!(json["type"], "tick");
    assert_eq!(json["elapsedSecs"], 1);
}

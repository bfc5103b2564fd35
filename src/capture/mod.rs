//! Capture sources
//!
//! Device acquisition traits, the stream/track model and, behind the
//! `native-devices` feature, camera, microphone and display backends.

pub mod stream;
pub mod traits;

#[cfg(feature = "native-devices")]
pub mod native;

pub use stream::{
    BufferedTrack, MediaStream, MediaTrack, SourceHandle, TrackFormat, TrackKind, TrackSource,
};
pub use traits::{
    AudioDeviceInfo, CameraConstraints, CameraInfo, DeviceError, DisplayInfo, MediaDevices,
    Resolution, ScreenConstraints, SourceKind,
};

use super::Frame;
use crate::capture::traits::{DeviceError, DisplayInfo};

fn unavailable() -> DeviceError {
    DeviceError::DeviceUnavailable("Display capture is not supported on this platform".to_string())
}

pub fn list_displays() -> Vec<DisplayInfo> {
    Vec::new()
}

pub fn ensure_access() -> Result<(), DeviceError> {
    Err(unavailable())
}

pub fn grab_frame() -> Result<Frame, DeviceError> {
    Err(unavailable())
}

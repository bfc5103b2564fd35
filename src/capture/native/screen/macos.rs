//! macOS display capture using CoreGraphics

use super::{pack_rows, Frame};
use crate::capture::traits::{DeviceError, DisplayInfo};
use core_graphics::access::ScreenCaptureAccess;
use core_graphics::display::CGDisplay;

pub fn list_displays() -> Vec<DisplayInfo> {
    let display_ids = CGDisplay::active_displays().unwrap_or_default();

    display_ids
        .iter()
        .enumerate()
        .map(|(index, &id)| {
            let display = CGDisplay::new(id);
            let is_main = display.is_main();

            DisplayInfo {
                id,
                name: if is_main {
                    "Main Display".to_string()
                } else {
                    format!("Display {}", index + 1)
                },
                width: display.pixels_wide() as u32,
                height: display.pixels_high() as u32,
                is_primary: is_main,
            }
        })
        .collect()
}

/// Screen recording needs the user's consent; asking shows the system prompt
pub fn ensure_access() -> Result<(), DeviceError> {
    if ScreenCaptureAccess::preflight() {
        return Ok(());
    }

    ScreenCaptureAccess::request();
    Err(DeviceError::PermissionDenied(
        "Screen recording permission not granted. Please allow in System Settings.".to_string(),
    ))
}

pub fn grab_frame() -> Result<Frame, DeviceError> {
    let image = CGDisplay::main()
        .image()
        .ok_or_else(|| DeviceError::Backend("Failed to capture display image".to_string()))?;

    if image.bits_per_pixel() != 32 {
        return Err(DeviceError::Backend(format!(
            "Unexpected display pixel size: {} bits",
            image.bits_per_pixel()
        )));
    }

    let width = image.width() as u32;
    let height = image.height() as u32;
    let data = image.data();
    let data = pack_rows(data.bytes(), image.bytes_per_row(), width, height)
        .ok_or_else(|| DeviceError::Backend("Display image buffer is truncated".to_string()))?;

    Ok(Frame {
        data,
        width,
        height,
    })
}

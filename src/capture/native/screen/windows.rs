//! Windows display capture using GDI BitBlt

use super::Frame;
use crate::capture::traits::{DeviceError, DisplayInfo};
use std::mem::zeroed;
use windows::Win32::Foundation::{BOOL, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject,
    EnumDisplayMonitors, GetDC, GetDIBits, GetMonitorInfoW, ReleaseDC, SelectObject, BITMAPINFO,
    BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HDC, HMONITOR, MONITORINFOEXW, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::GetDesktopWindow;

const MONITORINFOF_PRIMARY: u32 = 1;

unsafe extern "system" fn enum_monitors_callback(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let displays = &mut *(lparam.0 as *mut Vec<DisplayInfo>);

    let mut monitor_info: MONITORINFOEXW = zeroed();
    monitor_info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

    if GetMonitorInfoW(hmonitor, &mut monitor_info.monitorInfo).as_bool() {
        let rect = monitor_info.monitorInfo.rcMonitor;
        let is_primary = (monitor_info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY) != 0;

        let name_len = monitor_info
            .szDevice
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(monitor_info.szDevice.len());
        let name = String::from_utf16_lossy(&monitor_info.szDevice[..name_len]);

        displays.push(DisplayInfo {
            id: displays.len() as u32,
            name: if is_primary {
                "Primary Display".to_string()
            } else {
                name
            },
            width: (rect.right - rect.left) as u32,
            height: (rect.bottom - rect.top) as u32,
            is_primary,
        });
    }

    BOOL::from(true)
}

pub fn list_displays() -> Vec<DisplayInfo> {
    let mut displays: Vec<DisplayInfo> = Vec::new();
    let displays_ptr = &mut displays as *mut Vec<DisplayInfo>;

    unsafe {
        let _ = EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(enum_monitors_callback),
            LPARAM(displays_ptr as isize),
        );
    }

    displays
}

/// GDI capture needs no consent
pub fn ensure_access() -> Result<(), DeviceError> {
    Ok(())
}

/// Copy the primary display, which starts at the desktop origin
pub fn grab_frame() -> Result<Frame, DeviceError> {
    let display = list_displays()
        .into_iter()
        .find(|d| d.is_primary)
        .ok_or_else(|| DeviceError::DeviceUnavailable("No display found".to_string()))?;
    let (width, height) = (display.width, display.height);

    unsafe {
        let hwnd = GetDesktopWindow();
        let hdc_screen = GetDC(hwnd);
        if hdc_screen.is_invalid() {
            return Err(DeviceError::Backend("Failed to get desktop DC".to_string()));
        }

        let hdc_mem = CreateCompatibleDC(hdc_screen);
        if hdc_mem.is_invalid() {
            ReleaseDC(hwnd, hdc_screen);
            return Err(DeviceError::Backend("Failed to create memory DC".to_string()));
        }

        let hbitmap = CreateCompatibleBitmap(hdc_screen, width as i32, height as i32);
        if hbitmap.is_invalid() {
            let _ = DeleteDC(hdc_mem);
            ReleaseDC(hwnd, hdc_screen);
            return Err(DeviceError::Backend("Failed to create bitmap".to_string()));
        }

        let old_bitmap = SelectObject(hdc_mem, hbitmap);
        let copied = BitBlt(
            hdc_mem,
            0,
            0,
            width as i32,
            height as i32,
            hdc_screen,
            0,
            0,
            SRCCOPY,
        );

        let mut lines = 0;
        let mut buffer = vec![0u8; (width * height * 4) as usize];
        if copied.is_ok() {
            let mut bmi: BITMAPINFO = zeroed();
            bmi.bmiHeader.biSize = std::mem::size_of::<BITMAPINFOHEADER>() as u32;
            bmi.bmiHeader.biWidth = width as i32;
            // Negative height gives top-down rows
            bmi.bmiHeader.biHeight = -(height as i32);
            bmi.bmiHeader.biPlanes = 1;
            bmi.bmiHeader.biBitCount = 32;
            bmi.bmiHeader.biCompression = BI_RGB.0;

            lines = GetDIBits(
                hdc_mem,
                hbitmap,
                0,
                height,
                Some(buffer.as_mut_ptr() as *mut _),
                &mut bmi,
                DIB_RGB_COLORS,
            );
        }

        SelectObject(hdc_mem, old_bitmap);
        let _ = DeleteObject(hbitmap);
        let _ = DeleteDC(hdc_mem);
        ReleaseDC(hwnd, hdc_screen);

        if let Err(e) = copied {
            return Err(DeviceError::Backend(format!("BitBlt failed: {e}")));
        }
        if lines == 0 {
            return Err(DeviceError::Backend("GetDIBits returned no rows".to_string()));
        }

        Ok(Frame {
            data: buffer,
            width,
            height,
        })
    }
}

//! Monitor capture using the `xcap` crate.
//!
//! This is the layer that talks to the OS. Everything after the raw
//! capture (crop, encode) is plain `image` work and stays in memory.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use xcap::Monitor;

use crate::capture::region::Region;
use crate::errors::{ScreenMonitorError, ScreenMonitorResult};

/// Physical desktop position of the monitor the selection was made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorPoint {
    pub x: i32,
    pub y: i32,
}

/// PNG bytes of a cropped selection plus the rectangle actually used.
#[derive(Debug, Clone)]
pub struct CapturedRegion {
    pub png_bytes: Vec<u8>,
    pub region: Region,
}

/// Captures the monitor containing `point`, falling back to the primary
/// monitor and then to the first one reported.
pub fn capture_monitor_at(point: Option<MonitorPoint>) -> ScreenMonitorResult<DynamicImage> {
    let monitors = Monitor::all()
        .map_err(|e| ScreenMonitorError::Capture(format!("failed to enumerate monitors: {e}")))?;

    let containing = point.and_then(|p| monitors.iter().position(|m| contains(m, p)));
    let primary = || monitors.iter().position(|m| m.is_primary().unwrap_or(false));
    let index = containing
        .or_else(primary)
        .or_else(|| (!monitors.is_empty()).then_some(0))
        .ok_or_else(|| ScreenMonitorError::Capture("no monitor found".into()))?;

    let monitor = &monitors[index];
    let image = monitor
        .capture_image()
        .map_err(|e| ScreenMonitorError::Capture(format!("screen capture failed: {e}")))?;

    tracing::debug!(
        monitor = index,
        width = image.width(),
        height = image.height(),
        "monitor captured"
    );
    Ok(DynamicImage::ImageRgba8(image))
}

fn contains(monitor: &Monitor, p: MonitorPoint) -> bool {
    let (Ok(x), Ok(y), Ok(w), Ok(h)) = (
        monitor.x(),
        monitor.y(),
        monitor.width(),
        monitor.height(),
    ) else {
        return false;
    };
    p.x >= x && p.y >= y && p.x < x + w as i32 && p.y < y + h as i32
}

/// Crops `image` to `region` (clamped to the image) and PNG-encodes it.
pub fn crop_to_png(image: &DynamicImage, region: Region) -> ScreenMonitorResult<CapturedRegion> {
    let clamped = region.clamp_to(image.width(), image.height());
    if clamped.is_empty() {
        return Err(ScreenMonitorError::Selection(format!(
            "selected area {region} is empty or outside the {}x{} screen",
            image.width(),
            image.height()
        )));
    }

    let cropped = image.crop_imm(clamped.x, clamped.y, clamped.width, clamped.height);
    let mut png_bytes: Vec<u8> = Vec::new();
    cropped.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;

    Ok(CapturedRegion {
        png_bytes,
        region: clamped,
    })
}

/// Capture + crop + encode. Blocking; call from `spawn_blocking`.
pub fn capture_region_png(
    point: Option<MonitorPoint>,
    region: Region,
) -> ScreenMonitorResult<CapturedRegion> {
    let start = std::time::Instant::now();
    let screen = capture_monitor_at(point)?;
    let captured = crop_to_png(&screen, region)?;
    tracing::info!(
        region = %captured.region,
        bytes = captured.png_bytes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "region captured and encoded"
    );
    Ok(captured)
}

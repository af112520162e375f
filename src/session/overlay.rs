//! Fullscreen translucent window the user drags a rectangle on.

use tauri::{AppHandle, Manager, Runtime, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::capture::MonitorPoint;
use crate::errors::ScreenMonitorResult;

pub const OVERLAY_LABEL: &str = "overlay";

/// What the capture needs to know about where the overlay was shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGeometry {
    /// Logical → physical pixel factor of the overlay's monitor.
    pub scale_factor: f64,
    pub monitor: Option<MonitorPoint>,
}

impl Default for OverlayGeometry {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            monitor: None,
        }
    }
}

/// The selection window as the capture flow sees it. The app drives a
/// Tauri webview; tests substitute a fake.
pub trait SelectionOverlay {
    fn open(&self) -> ScreenMonitorResult<()>;
    /// Returns the geometry read just before the window went away.
    fn close(&self) -> ScreenMonitorResult<OverlayGeometry>;
    fn is_open(&self) -> bool;
}

impl<R: Runtime> SelectionOverlay for AppHandle<R> {
    fn open(&self) -> ScreenMonitorResult<()> {
        open_overlay(self)
    }

    fn close(&self) -> ScreenMonitorResult<OverlayGeometry> {
        close_overlay(self)
    }

    fn is_open(&self) -> bool {
        self.get_webview_window(OVERLAY_LABEL).is_some()
    }
}

pub fn open_overlay<R: Runtime>(app: &AppHandle<R>) -> ScreenMonitorResult<()> {
    if let Some(existing) = app.get_webview_window(OVERLAY_LABEL) {
        existing.set_focus()?;
        return Ok(());
    }

    WebviewWindowBuilder::new(app, OVERLAY_LABEL, WebviewUrl::App("overlay.html".into()))
        .title("Screen Monitor Selection")
        .fullscreen(true)
        .transparent(true)
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .focused(true)
        .build()?;

    tracing::debug!("selection overlay opened");
    Ok(())
}

/// Closes the overlay, returning its geometry as seen just before closing.
pub fn close_overlay<R: Runtime>(app: &AppHandle<R>) -> ScreenMonitorResult<OverlayGeometry> {
    let Some(window) = app.get_webview_window(OVERLAY_LABEL) else {
        tracing::debug!("overlay already closed");
        return Ok(OverlayGeometry::default());
    };
    let geometry = geometry_of(&window);
    window.close()?;
    tracing::debug!(?geometry, "selection overlay closed");
    Ok(geometry)
}

fn geometry_of<R: Runtime>(window: &WebviewWindow<R>) -> OverlayGeometry {
    match window.current_monitor() {
        Ok(Some(monitor)) => {
            let pos = monitor.position();
            OverlayGeometry {
                scale_factor: monitor.scale_factor(),
                monitor: Some(MonitorPoint { x: pos.x, y: pos.y }),
            }
        }
        Ok(None) | Err(_) => OverlayGeometry {
            scale_factor: window.scale_factor().unwrap_or(1.0),
            monitor: None,
        },
    }
}

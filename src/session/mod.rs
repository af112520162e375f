//! Capture flow: trigger → overlay selection → background analysis.

pub mod output;
pub mod overlay;
pub mod state;
pub mod worker;

use std::sync::RwLock;
use std::time::Duration;

use tauri::{AppHandle, Manager, Runtime};

use crate::capture::{DragPoint, Region};
use crate::config::AppConfig;
use crate::errors::{ScreenMonitorError, ScreenMonitorResult};
use output::{format_error, OutputSink, MSG_CANCELED, MSG_CAPTURING, MSG_SELECT_AREA};
use overlay::SelectionOverlay;
use state::{Session, SessionState};
use worker::CaptureJob;

/// Shared app state managed by Tauri.
pub struct AppState {
    pub session: Session,
    config: RwLock<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            session: Session::new(),
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> AppConfig {
        self.config
            .read()
            .map(|c| c.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn set_config(&self, config: AppConfig) {
        match self.config.write() {
            Ok(mut guard) => *guard = config,
            Err(e) => *e.into_inner() = config,
        }
    }
}

/// Button, hotkey and tray all land here.
pub fn start_selection<R: Runtime>(app: &AppHandle<R>) -> ScreenMonitorResult<()> {
    let state = app.state::<AppState>();
    begin_selection(&state.session, app, app)
}

/// Fire-and-forget trigger for the shortcut and the tray, which have no
/// caller to hand the error back to.
pub fn trigger_capture<R: Runtime>(app: &AppHandle<R>, source: &'static str) {
    if let Err(e) = start_selection(app) {
        tracing::debug!(source, error = %e, "capture not started");
    }
}

/// Esc in the overlay.
pub fn cancel_selection<R: Runtime>(app: &AppHandle<R>) -> ScreenMonitorResult<()> {
    let state = app.state::<AppState>();
    end_selection(&state.session, app, app)
}

/// Mouse release in the overlay: close it and hand the region to a worker.
pub fn submit_selection<R: Runtime>(
    app: &AppHandle<R>,
    start: DragPoint,
    end: DragPoint,
) -> ScreenMonitorResult<()> {
    let state = app.state::<AppState>();
    let settle_delay = Duration::from_millis(state.config().capture.settle_delay_ms);
    let job = prepare_capture(&state.session, app, app, start, end, settle_delay)?;
    tauri::async_runtime::spawn(worker::run_job(app.clone(), job));
    Ok(())
}

/// The overlay window went away. Covers Alt+F4, the window manager and a
/// page that never loaded, none of which call back into a command.
pub fn overlay_destroyed<R: Runtime>(app: &AppHandle<R>) {
    let state = app.state::<AppState>();
    selection_abandoned(&state.session, app);
}

fn begin_selection<O, W>(session: &Session, out: &O, overlay: &W) -> ScreenMonitorResult<()>
where
    O: OutputSink,
    W: SelectionOverlay,
{
    if session.current() == SessionState::Selecting && !overlay.is_open() {
        tracing::warn!("selecting without an overlay; resetting stale selection");
        session.cancel_selection();
    }
    if let Err(e) = session.begin_selection() {
        tracing::info!(state = ?session.current(), "capture already in progress; trigger ignored");
        return Err(e);
    }

    tracing::info!("selection started");
    out.show_output_text(MSG_SELECT_AREA);
    if let Err(e) = overlay.open() {
        tracing::error!(error = %e, "failed to open selection overlay");
        session.finish();
        out.show_output_text(&format_error(&e));
        return Err(e);
    }
    Ok(())
}

fn end_selection<O, W>(session: &Session, out: &O, overlay: &W) -> ScreenMonitorResult<()>
where
    O: OutputSink,
    W: SelectionOverlay,
{
    let closed = overlay.close();
    selection_abandoned(session, out);
    if let Err(e) = &closed {
        tracing::error!(error = %e, "failed to close selection overlay");
        out.show_output_text(&format_error(e));
    }
    closed.map(|_| ())
}

fn selection_abandoned<O: OutputSink>(session: &Session, out: &O) {
    if session.cancel_selection() {
        tracing::info!("selection canceled");
        out.show_output_text(MSG_CANCELED);
    }
}

/// Moves to Analyzing before the overlay closes, so the close event that
/// follows finds nothing left to cancel.
fn prepare_capture<O, W>(
    session: &Session,
    out: &O,
    overlay: &W,
    start: DragPoint,
    end: DragPoint,
    settle_delay: Duration,
) -> ScreenMonitorResult<CaptureJob>
where
    O: OutputSink,
    W: SelectionOverlay,
{
    session.begin_analysis()?;
    let geometry = match overlay.close() {
        Ok(geometry) => geometry,
        Err(e) => {
            tracing::error!(error = %e, "failed to close selection overlay");
            session.finish();
            out.show_output_text(&format_error(&e));
            return Err(e);
        }
    };

    let logical = Region::from_drag(start, end);
    let region = logical.scaled(geometry.scale_factor);
    tracing::info!(
        logical = %logical,
        physical = %region,
        scale = geometry.scale_factor,
        "selection submitted"
    );

    if region.is_empty() {
        session.finish();
        let err = ScreenMonitorError::Selection("selected area is empty".into());
        out.show_output_text(&format_error(&err));
        return Err(err);
    }

    out.show_loading(MSG_CAPTURING);
    Ok(CaptureJob {
        region,
        monitor: geometry.monitor,
        settle_delay,
    })
}

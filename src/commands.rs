use tauri::{AppHandle, State};

use crate::capture::DragPoint;
use crate::config::{self, AppConfig};
use crate::hotkeys::{self, GlobalHotkeyState, HotkeyStatus};
use crate::session::output::welcome_message;
use crate::session::{self, state::SessionState, AppState};

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusReport {
    pub session: SessionState,
    pub hotkey: HotkeyStatus,
    pub welcome: String,
    pub version: String,
}

/// Get app version.
#[tauri::command]
pub async fn get_version() -> Result<String, String> {
    Ok(env!("CARGO_PKG_VERSION").to_string())
}

/// "Screenshot" button.
#[tauri::command]
pub async fn start_selection(app: AppHandle) -> Result<(), String> {
    session::start_selection(&app).map_err(|e| e.to_string())
}

/// Mouse release on the overlay, in overlay (logical) pixels.
#[tauri::command]
pub async fn submit_selection(
    app: AppHandle,
    start_x: f64,
    start_y: f64,
    end_x: f64,
    end_y: f64,
) -> Result<(), String> {
    session::submit_selection(
        &app,
        DragPoint::new(start_x, start_y),
        DragPoint::new(end_x, end_y),
    )
    .map_err(|e| e.to_string())
}

/// Esc on the overlay.
#[tauri::command]
pub async fn cancel_selection(app: AppHandle) -> Result<(), String> {
    session::cancel_selection(&app).map_err(|e| e.to_string())
}

/// Session + hotkey state; the main window reads this on load.
#[tauri::command]
pub async fn get_status(
    state: State<'_, AppState>,
    hotkey: State<'_, GlobalHotkeyState>,
) -> Result<StatusReport, String> {
    let (hotkey, welcome) = hotkey
        .lock()
        .map(|rt| (rt.status(), welcome_message(rt.active_label())))
        .map_err(|e| e.to_string())?;
    Ok(StatusReport {
        session: state.session.current(),
        hotkey,
        welcome,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[tauri::command]
pub async fn get_config(state: State<'_, AppState>) -> Result<AppConfig, String> {
    let mut cfg = state.config();
    // never hand the key to the webview
    cfg.llm.api_key = None;
    Ok(cfg)
}

/// Saves config.toml, applies it, and re-registers the shortcut.
#[tauri::command]
pub async fn save_config_ui(
    app: AppHandle,
    state: State<'_, AppState>,
    hotkey: State<'_, GlobalHotkeyState>,
    mut config: AppConfig,
) -> Result<(), String> {
    if config.llm.api_key.is_none() {
        config.llm.api_key = state.config().llm.api_key;
    }
    config::save_config(&config).map_err(|e| e.to_string())?;
    hotkeys::refresh_global_hotkey(&app, &hotkey, &config.hotkey);
    state.set_config(config);
    Ok(())
}

pub mod capture;
pub mod commands;
pub mod config;
pub mod errors;
pub mod hotkeys;
pub mod llm;
pub mod session;
pub mod tray;

use std::sync::{Arc, Mutex};

use tauri::{Manager, WindowEvent};

use crate::hotkeys::{GlobalHotkeyState, HotkeyRuntime};
use crate::session::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let app_config = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config; starting with defaults");
            config::AppConfig::default()
        }
    };
    let hotkey_config = app_config.hotkey.clone();

    let hotkey_state: GlobalHotkeyState = Arc::new(Mutex::new(HotkeyRuntime::default()));
    let handler_state = hotkey_state.clone();

    let shortcut_plugin = tauri_plugin_global_shortcut::Builder::new()
        .with_handler(move |app, shortcut, event| {
            hotkeys::handle_global_shortcut_event(app, shortcut, event.state(), &handler_state, |app| {
                session::trigger_capture(app, "shortcut");
            });
        })
        .build();

    if let Err(e) = tauri::Builder::default()
        .plugin(shortcut_plugin)
        .manage(AppState::new(app_config))
        .manage(hotkey_state.clone())
        .invoke_handler(tauri::generate_handler![
            commands::get_version,
            commands::start_selection,
            commands::submit_selection,
            commands::cancel_selection,
            commands::get_status,
            commands::get_config,
            commands::save_config_ui,
        ])
        .on_window_event(|window, event| {
            if window.label() == session::overlay::OVERLAY_LABEL
                && matches!(event, WindowEvent::Destroyed)
            {
                session::overlay_destroyed(window.app_handle());
            }
        })
        .setup(move |app| {
            tracing::info!("Screen Monitor starting up");
            hotkeys::refresh_global_hotkey(app.handle(), &hotkey_state, &hotkey_config);
            tray::setup_tray(app.handle())?;
            Ok(())
        })
        .run(tauri::generate_context!())
    {
        tracing::error!(error = %e, "error while running Screen Monitor");
        std::process::exit(1);
    }
}

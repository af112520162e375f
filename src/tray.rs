//! Tray icon: a second way to start a capture, plus Show and Quit.

use tauri::{
    menu::{MenuBuilder, MenuItemBuilder},
    tray::{MouseButton, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager, Runtime,
};

use crate::session;

pub fn setup_tray<R: Runtime>(app: &AppHandle<R>) -> Result<(), Box<dyn std::error::Error>> {
    let screenshot_item = MenuItemBuilder::with_id("screenshot", "Screenshot").build(app)?;
    let show_item = MenuItemBuilder::with_id("show", "Show Window").build(app)?;
    let quit_item = MenuItemBuilder::with_id("quit", "Quit Screen Monitor").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&screenshot_item)
        .item(&show_item)
        .separator()
        .item(&quit_item)
        .build()?;

    let mut builder = TrayIconBuilder::new()
        .tooltip("Screen Monitor")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                ..
            } = event
            {
                show_main_window(tray_icon.app_handle());
            }
        })
        .on_menu_event(|app, event| match event.id().0.as_str() {
            "screenshot" => {
                tracing::info!("capture requested from tray");
                session::trigger_capture(app, "tray");
            }
            "show" => show_main_window(app),
            "quit" => {
                tracing::info!("quit requested from tray menu");
                app.exit(0);
            }
            _ => {}
        });
    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone());
    }
    builder.build(app)?;

    Ok(())
}

fn show_main_window<R: Runtime>(app: &AppHandle<R>) {
    if let Some(win) = app.get_webview_window("main") {
        let _ = win.show();
        let _ = win.set_focus();
    }
}

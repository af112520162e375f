//! Global keyboard shortcut that opens the selection overlay.
//!
//! The key comes from `[hotkey]` in config.toml (PageUp by default, no
//! modifiers). Registration goes through the Tauri global-shortcut plugin. On
//! Wayland native global shortcuts are unavailable; the button and tray still
//! work.

use std::sync::{Arc, Mutex};

use tauri::{AppHandle, Runtime};
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};

use crate::config::HotkeyConfig;

/// Runtime state for the capture shortcut, stored in Tauri state.
#[derive(Debug, Clone, Default)]
pub struct HotkeyRuntime {
    pub enabled: bool,
    pub native_active: bool,
    pub shortcut: Option<Shortcut>,
    pub label: String,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HotkeyStatus {
    pub enabled: bool,
    pub native_active: bool,
    pub shortcut: String,
    pub last_error: Option<String>,
}

pub type GlobalHotkeyState = Arc<Mutex<HotkeyRuntime>>;

impl HotkeyRuntime {
    pub fn status(&self) -> HotkeyStatus {
        HotkeyStatus {
            enabled: self.enabled,
            native_active: self.native_active,
            shortcut: self.label.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Label to show in the welcome text, only when the shortcut is live.
    pub fn active_label(&self) -> Option<&str> {
        self.native_active.then_some(self.label.as_str())
    }
}

fn current_session_type() -> String {
    std::env::var("XDG_SESSION_TYPE")
        .unwrap_or_else(|_| "unknown".to_string())
        .to_lowercase()
}

fn supports_native_hotkeys() -> bool {
    #[cfg(target_os = "linux")]
    {
        current_session_type() != "wayland"
    }
    #[cfg(not(target_os = "linux"))]
    {
        true
    }
}

// --- Parsing ---

fn parse_modifier_token(token: &str) -> Option<Modifiers> {
    match token {
        "control" | "ctrl" => Some(Modifiers::CONTROL),
        "shift" => Some(Modifiers::SHIFT),
        "alt" | "option" => Some(Modifiers::ALT),
        "command" | "cmd" | "super" | "meta" => Some(Modifiers::SUPER),
        _ => None,
    }
}

fn split_tokens(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(|c: char| c == '+' || c == ',' || c.is_whitespace())
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
}

pub fn parse_modifiers(raw: &str) -> Result<Option<Modifiers>, String> {
    let mut modifiers = Modifiers::empty();
    for token in split_tokens(raw) {
        let parsed = parse_modifier_token(&token)
            .ok_or_else(|| format!("Unsupported modifier token: {token}"))?;
        modifiers |= parsed;
    }
    Ok((!modifiers.is_empty()).then_some(modifiers))
}

pub fn parse_key_code(raw: &str) -> Result<Code, String> {
    let key = raw.trim().to_lowercase().replace(['_', '-', ' '], "");
    let code = match key.as_str() {
        "pageup" | "pgup" | "prior" => Code::PageUp,
        "pagedown" | "pgdn" | "next" => Code::PageDown,
        "home" => Code::Home,
        "end" => Code::End,
        "insert" | "ins" => Code::Insert,
        "printscreen" | "prtsc" | "print" => Code::PrintScreen,
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        _ => return Err(format!("Unsupported hotkey key: {}", raw.trim())),
    };
    Ok(code)
}

pub fn build_shortcut(cfg: &HotkeyConfig) -> Result<Shortcut, String> {
    let mods = parse_modifiers(&cfg.modifiers)?;
    let code = parse_key_code(&cfg.key)?;
    Ok(Shortcut::new(mods, code))
}

pub fn shortcut_label(cfg: &HotkeyConfig) -> String {
    let mut parts: Vec<String> = split_tokens(&cfg.modifiers)
        .map(|token| {
            let label = match token.as_str() {
                "control" | "ctrl" => "Ctrl",
                "shift" => "Shift",
                "alt" | "option" => "Alt",
                "command" | "cmd" => "Cmd",
                "super" | "meta" => "Super",
                other => other,
            };
            label.to_string()
        })
        .collect();
    parts.push(cfg.key.trim().to_string());
    parts.join("+")
}

// --- Registration and event handling ---

/// (Re-)registers the capture shortcut from `cfg`. Called at startup and
/// after the config is saved. Failures are recorded, never fatal.
pub fn refresh_global_hotkey<R: Runtime>(
    app: &AppHandle<R>,
    state: &GlobalHotkeyState,
    cfg: &HotkeyConfig,
) {
    let label = shortcut_label(cfg);
    let outcome = register(app, cfg);

    let Ok(mut runtime) = state.lock() else {
        return;
    };
    runtime.enabled = cfg.enabled;
    runtime.label = label.clone();
    match outcome {
        Ok(shortcut) => {
            runtime.native_active = shortcut.is_some();
            runtime.shortcut = shortcut;
            runtime.last_error = None;
            if runtime.native_active {
                tracing::info!(shortcut = %label, "global capture shortcut registered");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, shortcut = %label, "global capture shortcut unavailable");
            runtime.native_active = false;
            runtime.shortcut = None;
            runtime.last_error = Some(e);
        }
    }
}

fn register<R: Runtime>(app: &AppHandle<R>, cfg: &HotkeyConfig) -> Result<Option<Shortcut>, String> {
    app.global_shortcut()
        .unregister_all()
        .map_err(|e| format!("Failed to clear old global shortcuts: {e}"))?;

    if !cfg.enabled {
        tracing::info!("global capture shortcut disabled in config");
        return Ok(None);
    }
    if !supports_native_hotkeys() {
        return Err(format!(
            "native global shortcuts are not supported in a {} session",
            current_session_type()
        ));
    }

    let shortcut = build_shortcut(cfg)?;
    app.global_shortcut()
        .register(shortcut)
        .map_err(|e| format!("Failed to register {}: {e}", shortcut_label(cfg)))?;
    Ok(Some(shortcut))
}

/// True when a press of `shortcut` should start a capture.
pub fn is_capture_press(runtime: &HotkeyRuntime, shortcut: &Shortcut, event_state: ShortcutState) -> bool {
    event_state == ShortcutState::Pressed
        && runtime.native_active
        && runtime.shortcut.as_ref() == Some(shortcut)
}

/// Handler installed on the global-shortcut plugin.
pub fn handle_global_shortcut_event<R, F>(
    app: &AppHandle<R>,
    shortcut: &Shortcut,
    event_state: ShortcutState,
    hotkey_state: &GlobalHotkeyState,
    dispatch: F,
) where
    R: Runtime,
    F: Fn(&AppHandle<R>),
{
    let matched = match hotkey_state.lock() {
        Ok(runtime) => is_capture_press(&runtime, shortcut, event_state),
        Err(_) => false,
    };
    if matched {
        tracing::debug!("capture shortcut pressed");
        dispatch(app);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(modifiers: &str, key: &str) -> HotkeyConfig {
        HotkeyConfig {
            enabled: true,
            modifiers: modifiers.into(),
            key: key.into(),
        }
    }

    #[test]
    fn page_up_aliases() {
        for raw in ["PageUp", "page_up", "Page Up", "PgUp", "prior"] {
            assert_eq!(parse_key_code(raw).unwrap(), Code::PageUp, "{raw}");
        }
    }

    #[test]
    fn letters_digits_and_function_keys() {
        assert_eq!(parse_key_code("s").unwrap(), Code::KeyS);
        assert_eq!(parse_key_code("7").unwrap(), Code::Digit7);
        assert_eq!(parse_key_code("F12").unwrap(), Code::F12);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(parse_key_code("Hyper").is_err());
    }

    #[test]
    fn modifiers_parse_and_combine() {
        assert_eq!(parse_modifiers("").unwrap(), None);
        assert_eq!(
            parse_modifiers("ctrl+Shift").unwrap(),
            Some(Modifiers::CONTROL | Modifiers::SHIFT)
        );
        assert!(parse_modifiers("ctrl+hyper").is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(shortcut_label(&cfg("", "PageUp")), "PageUp");
        assert_eq!(shortcut_label(&cfg("ctrl, shift", "S")), "Ctrl+Shift+S");
    }

    #[test]
    fn default_config_builds_bare_page_up() {
        let shortcut = build_shortcut(&HotkeyConfig::default()).unwrap();
        assert_eq!(shortcut, Shortcut::new(None, Code::PageUp));
    }

    #[test]
    fn only_registered_press_triggers_capture() {
        let registered = Shortcut::new(None, Code::PageUp);
        let other = Shortcut::new(Some(Modifiers::CONTROL), Code::KeyR);
        let mut runtime = HotkeyRuntime {
            enabled: true,
            native_active: true,
            shortcut: Some(registered),
            label: "PageUp".into(),
            last_error: None,
        };

        assert!(is_capture_press(&runtime, &registered, ShortcutState::Pressed));
        assert!(!is_capture_press(&runtime, &registered, ShortcutState::Released));
        assert!(!is_capture_press(&runtime, &other, ShortcutState::Pressed));

        runtime.native_active = false;
        assert!(!is_capture_press(&runtime, &registered, ShortcutState::Pressed));
        assert_eq!(runtime.active_label(), None);
    }
}

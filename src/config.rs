use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{ScreenMonitorError, ScreenMonitorResult};

const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "screen-monitor";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Left out of the request when unset so the server default applies.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Stream the reply into the output panel as it arrives.
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional API key stored in config.toml (the OPENAI_API_KEY env var wins).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            temperature: None,
            stream: false,
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Resolves the bearer token: environment first, then config.toml.
    pub fn resolve_api_key(&self) -> ScreenMonitorResult<String> {
        let from_env = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        from_env
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                ScreenMonitorError::Config(format!(
                    "no API key: set {API_KEY_ENV} or llm.api_key in {CONFIG_FILE}"
                ))
            })
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Wait after the overlay closes so it is not in the captured frame.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// e.g. "" or "ctrl+shift"
    #[serde(default)]
    pub modifiers: String,
    #[serde(default = "default_hotkey_key")]
    pub key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            modifiers: String::new(),
            key: default_hotkey_key(),
        }
    }
}

fn default_hotkey_key() -> String {
    "PageUp".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Replaces the built-in coding-question prompt when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            candidates.push(parent.join(CONFIG_FILE));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(CONFIG_FILE));
    }
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(APP_DIR).join(CONFIG_FILE));
    }
    candidates
}

fn resolve_config_path() -> Option<PathBuf> {
    let found = candidate_paths().into_iter().find(|p| p.exists());
    if let Some(path) = &found {
        tracing::debug!(path = %path.display(), "config file found");
    }
    found
}

pub fn parse_config(content: &str) -> ScreenMonitorResult<AppConfig> {
    Ok(toml::from_str(content)?)
}

/// Loads config.toml, or the built-in defaults when no file exists.
pub fn load_config() -> ScreenMonitorResult<AppConfig> {
    let Some(path) = resolve_config_path() else {
        tracing::info!("no config.toml found; using defaults");
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(
        path = %path.display(),
        model = %config.llm.model,
        hotkey = %config.hotkey.key,
        "config loaded"
    );
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> ScreenMonitorResult<()> {
    let path = match resolve_config_path() {
        Some(path) => path,
        None => std::env::current_dir()?.join(CONFIG_FILE),
    };
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.llm.api_base, "https://api.openai.com/v1");
        assert!(!cfg.llm.stream);
        assert_eq!(cfg.capture.settle_delay_ms, 500);
        assert!(cfg.hotkey.enabled);
        assert_eq!(cfg.hotkey.key, "PageUp");
        assert!(cfg.prompt.text.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = parse_config(
            r#"
            [llm]
            model = "gpt-4o"
            stream = true

            [hotkey]
            modifiers = "ctrl+shift"
            key = "S"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.llm.model, "gpt-4o");
        assert!(cfg.llm.stream);
        assert_eq!(cfg.llm.timeout_secs, 120);
        assert_eq!(cfg.hotkey.modifiers, "ctrl+shift");
        assert_eq!(cfg.hotkey.key, "S");
        assert!(cfg.hotkey.enabled);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = parse_config("[llm\nmodel = 1").unwrap_err();
        assert!(matches!(err, ScreenMonitorError::TomlDe(_)));
    }

    #[test]
    fn config_survives_serialization() {
        let mut cfg = AppConfig::default();
        cfg.prompt.text = Some("Describe the image.".into());
        cfg.llm.temperature = Some(0.2);
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = parse_config(&text).unwrap();
        assert_eq!(back.prompt.text.as_deref(), Some("Describe the image."));
        assert_eq!(back.llm.temperature, Some(0.2));
        assert!(back.llm.api_key.is_none());
    }
}

//! Everything the user reads in the output panel goes through here.

use std::time::Duration;

use tauri::{AppHandle, Emitter, Runtime};

pub const EVENT_TEXT: &str = "output:text";
pub const EVENT_CHUNK: &str = "output:chunk";
pub const EVENT_LOADING: &str = "output:loading";

pub const MSG_SELECT_AREA: &str = "Please select the screenshot area...";
pub const MSG_CANCELED: &str = "Screenshot selection canceled.";
pub const MSG_CAPTURING: &str = "Taking screenshot and analyzing image content...";
pub const MSG_ANALYZING: &str = "Analyzing the image, please wait...";

/// Destination for output panel updates. The app emits Tauri events;
/// tests record calls.
pub trait OutputSink: Send + Sync {
    /// Replaces the panel contents.
    fn show_output_text(&self, text: &str);
    /// Appends to the panel contents (streamed replies).
    fn append_output_text(&self, text: &str);
    fn set_loading(&self, active: bool);

    fn show_loading(&self, message: &str) {
        self.show_output_text(message);
        self.set_loading(true);
    }

    fn hide_loading(&self) {
        self.set_loading(false);
    }
}

impl<R: Runtime> OutputSink for AppHandle<R> {
    fn show_output_text(&self, text: &str) {
        if let Err(e) = self.emit(EVENT_TEXT, text) {
            tracing::warn!(error = %e, "emit {EVENT_TEXT} failed");
        }
    }

    fn append_output_text(&self, text: &str) {
        if let Err(e) = self.emit(EVENT_CHUNK, text) {
            tracing::warn!(error = %e, "emit {EVENT_CHUNK} failed");
        }
    }

    fn set_loading(&self, active: bool) {
        if let Err(e) = self.emit(EVENT_LOADING, active) {
            tracing::warn!(error = %e, "emit {EVENT_LOADING} failed");
        }
    }
}

pub fn welcome_message(hotkey_label: Option<&str>) -> String {
    match hotkey_label {
        Some(label) => format!(
            "Monitoring active. Press {label} or click \"Screenshot\" to select an area and analyze the image content."
        ),
        None => "Monitoring active. Click \"Screenshot\" to select an area and analyze the image content."
            .to_string(),
    }
}

pub fn format_result(analysis: &str, elapsed: Duration) -> String {
    format!("Result:\n{analysis}\n\n(Response time: {:.2}s)", elapsed.as_secs_f64())
}

pub fn format_error(err: &dyn std::fmt::Display) -> String {
    format!("Image analysis error: {err}")
}


#[cfg(test)]
mod tests {
    use super::testing::{Recorded, RecordingSink};
    use super::*;

    #[test]
    fn result_carries_timing() {
        let text = format_result("Use a hash map.", Duration::from_millis(2340));
        assert_eq!(text, "Result:\nUse a hash map.\n\n(Response time: 2.34s)");
    }

    #[test]
    fn error_prefix() {
        assert_eq!(format_error(&"timeout"), "Image analysis error: timeout");
    }

    #[test]
    fn welcome_mentions_hotkey_when_registered() {
        assert!(welcome_message(Some("PageUp")).contains("Press PageUp"));
        assert!(!welcome_message(None).contains("Press"));
    }

    #[test]
    fn show_loading_sets_text_then_indicator() {
        let sink = RecordingSink::default();
        sink.show_loading(MSG_ANALYZING);
        sink.hide_loading();
        assert_eq!(
            sink.events(),
            vec![
                Recorded::Text(MSG_ANALYZING.to_string()),
                Recorded::Loading(true),
                Recorded::Loading(false),
            ]
        );
    }
}

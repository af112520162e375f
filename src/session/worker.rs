//! Background job: capture the selected region, send it to the model,
//! publish the reply. Runs off the UI thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tauri::{AppHandle, Manager, Runtime};

use crate::capture::{capture_region_png, CapturedRegion, MonitorPoint, Region};
use crate::config::AppConfig;
use crate::errors::{ScreenMonitorError, ScreenMonitorResult};
use crate::llm::prompt::{build_vision_messages, DEFAULT_PROMPT};
use crate::llm::provider::LlmProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::{CallConfig, StreamChunk, StreamChunkKind};
use crate::session::output::{format_error, format_result, OutputSink, MSG_ANALYZING};
use crate::session::AppState;

#[derive(Debug, Clone)]
pub struct CaptureJob {
    /// Physical pixels, relative to the monitor's top-left corner.
    pub region: Region,
    pub monitor: Option<MonitorPoint>,
    pub settle_delay: Duration,
}

/// Entry point spawned by `submit_selection`. Always returns the session to Idle.
pub async fn run_job<R: Runtime>(app: AppHandle<R>, job: CaptureJob) {
    let started = Instant::now();
    let state = app.state::<AppState>();
    let config = state.config();

    let result = capture_and_analyze(&app, &config, &job).await;
    report(&app, result, started.elapsed());
    state.session.finish();
}

async fn capture_and_analyze<O: OutputSink>(
    out: &O,
    config: &AppConfig,
    job: &CaptureJob,
) -> ScreenMonitorResult<String> {
    let provider = OpenAiCompatibleProvider::new(
        "openai".into(),
        &config.llm.api_base,
        config.llm.resolve_api_key()?,
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    let call = CallConfig {
        model: config.llm.model.clone(),
        stream: config.llm.stream,
        temperature: config.llm.temperature,
    };
    let prompt = config.prompt.text.as_deref().unwrap_or(DEFAULT_PROMPT);

    let captured = capture(job).await?;
    tracing::info!(
        provider = provider.name(),
        endpoint = provider.endpoint(),
        model = %call.model,
        "submitting capture"
    );
    analyze(out, &provider, &call, prompt, &captured.png_bytes).await
}

/// Waits for the overlay to leave the screen, then captures on a blocking thread.
pub async fn capture(job: &CaptureJob) -> ScreenMonitorResult<CapturedRegion> {
    tokio::time::sleep(job.settle_delay).await;
    let (monitor, region) = (job.monitor, job.region);
    tokio::task::spawn_blocking(move || capture_region_png(monitor, region))
        .await
        .map_err(|e| ScreenMonitorError::Capture(format!("join: {e}")))?
}

/// Sends the PNG with `prompt` and returns the reply text. Streamed deltas
/// are appended to the output panel as they arrive.
pub async fn analyze<O: OutputSink + ?Sized>(
    out: &O,
    provider: &dyn LlmProvider,
    call: &CallConfig,
    prompt: &str,
    png_bytes: &[u8],
) -> ScreenMonitorResult<String> {
    out.show_loading(MSG_ANALYZING);

    let messages = build_vision_messages(prompt, png_bytes);
    let streaming_started = AtomicBool::new(false);
    let on_chunk = |chunk: &StreamChunk| {
        if chunk.kind != StreamChunkKind::Content {
            return;
        }
        if !streaming_started.swap(true, Ordering::Relaxed) {
            out.show_output_text("Result:\n");
        }
        out.append_output_text(&chunk.content);
    };

    let response = provider.chat(messages, call, &on_chunk).await?;
    Ok(response.content)
}

/// Final panel text for a finished job, then the loading indicator goes away.
pub fn report<O: OutputSink + ?Sized>(
    out: &O,
    result: ScreenMonitorResult<String>,
    elapsed: Duration,
) {
    match result {
        Ok(analysis) => {
            tracing::info!(
                content_len = analysis.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "analysis complete"
            );
            tracing::debug!(%analysis, "analysis text");
            out.show_output_text(&format_result(&analysis, elapsed));
        }
        Err(e) => {
            tracing::error!(error = %e, "analysis failed");
            out.show_output_text(&format_error(&e));
        }
    }
    out.hide_loading();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChunkSink;
    use crate::llm::types::{ChatMessage, ContentPart, LlmResponse, MessageContent};
    use crate::session::output::testing::{Recorded, RecordingSink};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeProvider {
        reply: Result<Vec<&'static str>, &'static str>,
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl FakeProvider {
        fn replying(parts: Vec<&'static str>) -> Self {
            Self {
                reply: Ok(parts),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &'static str) -> Self {
            Self {
                reply: Err(msg),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn chat(
            &self,
            messages: Vec<ChatMessage>,
            cfg: &CallConfig,
            on_chunk: ChunkSink<'_>,
        ) -> ScreenMonitorResult<LlmResponse> {
            self.seen.lock().unwrap().extend(messages);
            let parts = self
                .reply
                .clone()
                .map_err(|m| ScreenMonitorError::LlmProvider(m.to_string()))?;
            if cfg.stream {
                for p in &parts {
                    on_chunk(&StreamChunk {
                        kind: StreamChunkKind::Content,
                        content: p.to_string(),
                    });
                }
                on_chunk(&StreamChunk {
                    kind: StreamChunkKind::Done,
                    content: String::new(),
                });
            }
            Ok(LlmResponse {
                content: parts.concat(),
            })
        }
    }

    fn call(stream: bool) -> CallConfig {
        CallConfig {
            model: "gpt-4o-mini".into(),
            stream,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn analyze_sends_prompt_and_image() {
        let sink = RecordingSink::default();
        let provider = FakeProvider::replying(vec!["Two pointers."]);

        let text = analyze(&sink, &provider, &call(false), "solve it", b"png")
            .await
            .unwrap();
        assert_eq!(text, "Two pointers.");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let MessageContent::Parts(parts) = &seen[0].content else {
            panic!("expected multipart content");
        };
        assert!(matches!(&parts[0], ContentPart::Text { text } if text == "solve it"));
        assert!(matches!(&parts[1], ContentPart::ImageUrl { image_url } if image_url.url.starts_with("data:image/png;base64,")));

        assert_eq!(
            sink.events(),
            vec![Recorded::Text(MSG_ANALYZING.to_string()), Recorded::Loading(true)]
        );
    }

    #[tokio::test]
    async fn streamed_reply_replaces_loading_text_once_then_appends() {
        let sink = RecordingSink::default();
        let provider = FakeProvider::replying(vec!["Use ", "BFS."]);

        let text = analyze(&sink, &provider, &call(true), "p", b"png").await.unwrap();
        assert_eq!(text, "Use BFS.");
        assert_eq!(
            sink.events(),
            vec![
                Recorded::Text(MSG_ANALYZING.to_string()),
                Recorded::Loading(true),
                Recorded::Text("Result:\n".to_string()),
                Recorded::Append("Use ".to_string()),
                Recorded::Append("BFS.".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let sink = RecordingSink::default();
        let provider = FakeProvider::failing("429 Too Many Requests");
        let err = analyze(&sink, &provider, &call(false), "p", b"png").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn report_success_shows_result_and_hides_loading() {
        let sink = RecordingSink::default();
        report(&sink, Ok("DP".into()), Duration::from_secs(1));
        assert_eq!(
            sink.last_text().as_deref(),
            Some("Result:\nDP\n\n(Response time: 1.00s)")
        );
        assert_eq!(sink.events().last(), Some(&Recorded::Loading(false)));
    }

    #[test]
    fn report_error_shows_message_and_hides_loading() {
        let sink = RecordingSink::default();
        report(
            &sink,
            Err(ScreenMonitorError::Selection("selected area is empty".into())),
            Duration::from_millis(10),
        );
        assert_eq!(
            sink.last_text().as_deref(),
            Some("Image analysis error: Selection error: selected area is empty")
        );
        assert_eq!(sink.events().last(), Some(&Recorded::Loading(false)));
    }
}

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::errors::{ScreenMonitorError, ScreenMonitorResult};
use crate::llm::provider::{ChunkSink, LlmProvider};
use crate::llm::sse_parser;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, StreamChunk, StreamChunkKind};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

pub struct OpenAiCompatibleProvider {
    id: String,
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
    /// Whole-request limit for JSON replies; idle limit between streamed chunks.
    timeout: Duration,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        id: String,
        api_base: &str,
        api_key: String,
        timeout: Duration,
    ) -> ScreenMonitorResult<Self> {
        let client = reqwest::Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            id,
            endpoint: chat_endpoint(api_base),
            api_key,
            client,
            timeout,
        })
    }

    fn timed_out(&self) -> ScreenMonitorError {
        ScreenMonitorError::LlmProvider(format!("{}: no data within {:?}", self.id, self.timeout))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Accepts either an API base (`https://host/v1`) or a full completions URL.
fn chat_endpoint(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    if base.ends_with(CHAT_COMPLETIONS_PATH) {
        base.to_string()
    } else {
        format!("{base}{CHAT_COMPLETIONS_PATH}")
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        cfg: &CallConfig,
        on_chunk: ChunkSink<'_>,
    ) -> ScreenMonitorResult<LlmResponse> {
        let mut body = serde_json::json!({
            "model": cfg.model,
            "messages": &messages,
            "stream": cfg.stream,
        });
        if let Some(temperature) = cfg.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            stream = cfg.stream,
            endpoint = %self.endpoint,
            "sending LLM request"
        );
        tracing::debug!(body = %sanitized_body(&body), "request body (base64 omitted)");

        let mut request = self.client.post(&self.endpoint).bearer_auth(&self.api_key).json(&body);
        if !cfg.stream {
            request = request.timeout(self.timeout);
        }
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| self.timed_out())??;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(ScreenMonitorError::LlmProvider(format!("{}: {}", status, err_body)));
        }

        if cfg.stream {
            self.handle_stream(response, on_chunk).await
        } else {
            self.handle_json(response).await
        }
    }
}

impl OpenAiCompatibleProvider {
    /// Reads the SSE body line by line, forwarding deltas and accumulating
    /// the full reply.
    async fn handle_stream(
        &self,
        response: reqwest::Response,
        on_chunk: ChunkSink<'_>,
    ) -> ScreenMonitorResult<LlmResponse> {
        let mut byte_stream = response.bytes_stream();
        // Bytes, not chars: a UTF-8 sequence may straddle two network chunks.
        let mut line_buf: Vec<u8> = Vec::new();
        let mut content = String::new();

        'stream: loop {
            let next = tokio::time::timeout(self.timeout, byte_stream.next())
                .await
                .map_err(|_| self.timed_out())?;
            let Some(result) = next else {
                break;
            };
            let bytes = result?;
            for &b in bytes.iter() {
                if b != b'\n' {
                    line_buf.push(b);
                    continue;
                }
                let line = String::from_utf8_lossy(&line_buf).trim().to_string();
                line_buf.clear();
                if line.is_empty() {
                    continue;
                }

                match sse_parser::parse_sse_line(&line) {
                    Ok(Some(chunk)) => {
                        if chunk.kind == StreamChunkKind::Done {
                            break 'stream;
                        }
                        content.push_str(&chunk.content);
                        on_chunk(&chunk);
                    }
                    Ok(None) => {}
                    Err(e @ ScreenMonitorError::LlmProvider(_)) => return Err(e),
                    Err(e) => {
                        tracing::debug!("SSE parse skipped: {e}");
                    }
                }
            }
        }

        on_chunk(&StreamChunk {
            kind: StreamChunkKind::Done,
            content: String::new(),
        });

        tracing::info!(content_len = content.len(), "LLM stream complete");
        Ok(LlmResponse {
            content: content.trim().to_string(),
        })
    }

    async fn handle_json(&self, response: reqwest::Response) -> ScreenMonitorResult<LlmResponse> {
        let json: serde_json::Value = response.json().await?;
        let content = extract_message_content(&json)?;
        tracing::info!(content_len = content.len(), "LLM JSON response received");
        Ok(LlmResponse { content })
    }
}

/// `choices[0].message.content`, trimmed.
pub fn extract_message_content(json: &serde_json::Value) -> ScreenMonitorResult<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            let detail = json["error"]["message"]
                .as_str()
                .unwrap_or("response has no choices[0].message.content");
            ScreenMonitorError::LlmProvider(detail.to_string())
        })
}

/// Request body for logging, with inline image payloads replaced.
fn sanitized_body(body: &serde_json::Value) -> String {
    let mut log_body = body.clone();
    if let Some(msgs) = log_body.get_mut("messages").and_then(|m| m.as_array_mut()) {
        for msg in msgs {
            let Some(parts) = msg.get_mut("content").and_then(|c| c.as_array_mut()) else {
                continue;
            };
            for part in parts {
                if part.get("type").and_then(|t| t.as_str()) != Some("image_url") {
                    continue;
                }
                if let Some(url) = part.get_mut("image_url").and_then(|i| i.get_mut("url")) {
                    *url = serde_json::Value::String("<omitted_base64_image>".to_string());
                }
            }
        }
    }
    serde_json::to_string(&log_body).unwrap_or_default()
}

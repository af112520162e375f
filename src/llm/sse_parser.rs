use crate::errors::{ScreenMonitorError, ScreenMonitorResult};
use crate::llm::types::{StreamChunk, StreamChunkKind};

/// Parses a raw SSE line (OpenAI-compatible format) into a StreamChunk.
/// Returns None if the line is a keep-alive or non-data line.
pub fn parse_sse_line(line: &str) -> ScreenMonitorResult<Option<StreamChunk>> {
    if line.is_empty() || line.starts_with(':') {
        return Ok(None);
    }

    let data = if let Some(d) = line.strip_prefix("data:") {
        d.trim()
    } else {
        return Ok(None);
    };

    if data == "[DONE]" {
        return Ok(Some(StreamChunk {
            kind: StreamChunkKind::Done,
            content: String::new(),
        }));
    }

    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| ScreenMonitorError::SseParsing(e.to_string()))?;

    if let Some(message) = json["error"]["message"].as_str() {
        return Err(ScreenMonitorError::LlmProvider(message.to_string()));
    }

    if let Some(first) = json["choices"].as_array().and_then(|c| c.first()) {
        if let Some(content) = first["delta"]["content"].as_str() {
            if !content.is_empty() {
                return Ok(Some(StreamChunk {
                    kind: StreamChunkKind::Content,
                    content: content.to_string(),
                }));
            }
        }

        // Finish reason signals done
        if first["finish_reason"].as_str().is_some() {
            return Ok(Some(StreamChunk {
                kind: StreamChunkKind::Done,
                content: String::new(),
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_delta() {
        let line = r#"data: {"choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.kind, StreamChunkKind::Content);
        assert_eq!(chunk.content, "Hello");
    }

    #[test]
    fn done_marker() {
        let chunk = parse_sse_line("data: [DONE]").unwrap().unwrap();
        assert_eq!(chunk.kind, StreamChunkKind::Done);
    }

    #[test]
    fn finish_reason_is_done() {
        let line = r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.kind, StreamChunkKind::Done);
    }

    #[test]
    fn role_only_delta_is_skipped() {
        let line = r#"data: {"choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#;
        assert!(parse_sse_line(line).unwrap().is_none());
    }

    #[test]
    fn keepalive_and_event_lines_are_skipped() {
        assert!(parse_sse_line(": ping").unwrap().is_none());
        assert!(parse_sse_line("event: message").unwrap().is_none());
        assert!(parse_sse_line("").unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_sse_line("data: {not json").unwrap_err();
        assert!(matches!(err, ScreenMonitorError::SseParsing(_)));
    }

    #[test]
    fn error_payload_surfaces_message() {
        let line = r#"data: {"error":{"message":"rate limited"}}"#;
        let err = parse_sse_line(line).unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}

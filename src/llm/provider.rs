use async_trait::async_trait;

use crate::errors::ScreenMonitorResult;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, StreamChunk};

/// Receives content deltas while a streamed reply is in flight.
pub type ChunkSink<'a> = &'a (dyn Fn(&StreamChunk) + Send + Sync);

/// Chat-completion backend. The app ships one implementation
/// (`OpenAiCompatibleProvider`); tests substitute their own.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Sends `messages` and returns the full reply text.
    /// When `cfg.stream` is set, `on_chunk` sees each delta as it arrives.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        cfg: &CallConfig,
        on_chunk: ChunkSink<'_>,
    ) -> ScreenMonitorResult<LlmResponse>;
}

//! Scripted provider for tests and offline runs.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    ChatMessage, ChatResponse, GenerationConfig, LlmProvider, ProviderInfo, TokenStream, ToolSchema,
};

/// Replays queued responses in order. When the queue is empty it echoes a
/// fixed fallback so an offline session still answers.
pub struct MockProvider {
    responses: Mutex<VecDeque<ChatResponse>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    fallback: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fallback: "I'm running offline, so I can't answer that right now.".to_string(),
        }
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.responses
            .lock()
            .push_back(ChatResponse::Content(text.into()));
        self
    }

    pub fn with_response(self, response: ChatResponse) -> Self {
        self.responses.lock().push_back(response);
        self
    }

    /// How many times the provider has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt or last user message seen, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    fn next(&self, prompt: String) -> ChatResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| ChatResponse::Content(self.fallback.clone()))
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String> {
        match self.next(prompt.to_string()) {
            ChatResponse::Content(text) => Ok(text),
            ChatResponse::ToolCalls(_) => Err(anyhow!("scripted tool call for a plain prompt")),
        }
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<TokenStream> {
        let text = self.generate(prompt, config).await?;
        // Split after each space so joined chunks equal the original text
        let chunks = text
            .split_inclusive(' ')
            .map(|chunk| chunk.to_string())
            .collect();
        Ok(TokenStream::from_chunks(chunks))
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSchema],
        _config: &GenerationConfig,
    ) -> Result<ChatResponse> {
        let last = messages
            .iter()
            .rev()
            .find_map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(self.next(last))
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Mock".to_string(),
            supports_streaming: true,
            supports_functions: true,
        }
    }
}

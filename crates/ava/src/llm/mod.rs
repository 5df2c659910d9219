//! LLM provider boundary.
//!
//! One completion or chat call per handler invocation, parameterised by
//! model, temperature and streaming.

pub mod mock;
pub mod openai;
pub mod streaming;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::config::LlmSettings;

pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use streaming::TokenStream;

/// Core trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Single-shot completion
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Completion delivered as an incremental token stream
    async fn generate_stream(&self, prompt: &str, config: &GenerationConfig)
        -> Result<TokenStream>;

    /// Chat completion with message history and optional tool schemas.
    /// Default implementation ignores tools and falls back to generate().
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSchema],
        config: &GenerationConfig,
    ) -> Result<ChatResponse> {
        let prompt = messages
            .iter()
            .filter_map(|m| m.content.as_ref().map(|c| format!("{:?}: {}", m.role, c)))
            .collect::<Vec<_>>()
            .join("\n");
        let text = self.generate(&prompt, config).await?;
        Ok(ChatResponse::Content(text))
    }

    fn info(&self) -> ProviderInfo;
}

/// Per-call generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub stream: bool,
}

impl GenerationConfig {
    pub fn for_model(settings: &LlmSettings, model: &str) -> Self {
        Self {
            model: model.to_string(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            stream: settings.streaming,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1024,
            temperature: 1.0,
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: Some(content.into()),
        }
    }
}

/// A tool call emitted by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// JSON arguments string
    pub arguments: String,
}

impl ToolCall {
    /// The `query` argument every tool takes. Falls back to the raw argument
    /// string when the model sent something that is not a JSON object.
    pub fn query(&self) -> String {
        match serde_json::from_str::<JsonValue>(&self.arguments) {
            Ok(JsonValue::Object(map)) => map
                .get("query")
                .and_then(|q| q.as_str())
                .unwrap_or_default()
                .to_string(),
            Ok(JsonValue::String(s)) => s,
            _ => self.arguments.trim().to_string(),
        }
    }
}

/// Schema describing a tool the LLM can call (OpenAI-compatible format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: JsonValue,
}

/// Either text content or the tools the model wants run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatResponse {
    Content(String),
    ToolCalls(Vec<ToolCall>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub supports_streaming: bool,
    pub supports_functions: bool,
}

//! OpenAI-compatible chat completions provider with SSE streaming.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{
    streaming::SseParser, ChatMessage, ChatResponse, GenerationConfig, LlmProvider, ProviderInfo,
    TokenStream, ToolCall, ToolSchema,
};
use crate::config::LlmSettings;

pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .tcp_nodelay(true)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(endpoint = %base_url, "Creating OpenAI-compatible provider");

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings.api_key.resolve().ok_or_else(|| {
            anyhow!(
                "No API key for the LLM provider; set {} or configure llm.api_key",
                settings.api_key.env
            )
        })?;
        Self::new(settings.base_url.clone(), api_key, settings.timeout_secs)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn format_messages(messages: &[ChatMessage]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|m| {
                let mut msg = json!({ "role": m.role.as_str() });
                if let Some(ref content) = m.content {
                    msg["content"] = json!(content);
                }
                msg
            })
            .collect()
    }

    fn format_tools(tools: &[ToolSchema]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect()
    }

    async fn post(&self, request: &serde_json::Value) -> Result<reqwest::Response> {
        let endpoint = self.endpoint();
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Request to {} timed out", endpoint)
                } else if e.is_connect() {
                    anyhow!("Failed to connect to {}: {}", endpoint, e)
                } else {
                    anyhow!("Request to {} failed: {}", endpoint, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            let preview: String = error.chars().take(300).collect();
            return Err(anyhow!("Chat API error (HTTP {}): {}", status, preview));
        }
        Ok(response)
    }

    /// Parse a response body as JSON, returning a clear error if the server
    /// returned an HTML error page instead.
    async fn parse_json(response: reqwest::Response) -> Result<serde_json::Value> {
        let body = response.text().await?;
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(anyhow!("Chat API returned HTML instead of JSON: {}", preview));
        }
        serde_json::from_str(&body).map_err(|e| anyhow!("Failed to parse chat response: {}", e))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        match self
            .chat(&[ChatMessage::user(prompt)], &[], config)
            .await?
        {
            ChatResponse::Content(text) => Ok(text),
            ChatResponse::ToolCalls(_) => Err(anyhow!("Model requested tools for a plain prompt")),
        }
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<TokenStream> {
        use futures::StreamExt;

        let request = json!({
            "model": config.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "stream": true
        });

        tracing::debug!(model = %config.model, prompt_len = prompt.len(), "Streaming completion");
        let response = self.post(&request).await?;

        let (sender, receiver) = tokio::sync::mpsc::channel::<String>(256);
        let mut byte_stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut parser = SseParser::new();
            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!(error = %e, "Stream interrupted");
                        break;
                    }
                };
                for delta in parser.feed(&chunk) {
                    if sender.send(delta).await.is_err() {
                        return;
                    }
                }
                if parser.is_done() {
                    return;
                }
            }
        });

        Ok(TokenStream::new(receiver))
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
        config: &GenerationConfig,
    ) -> Result<ChatResponse> {
        let mut request = json!({
            "model": config.model,
            "messages": Self::format_messages(messages),
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "stream": false
        });

        if !tools.is_empty() {
            request["tools"] = json!(Self::format_tools(tools));
            request["tool_choice"] = json!("auto");
        }

        tracing::debug!(
            model = %config.model,
            messages = messages.len(),
            tools = tools.len(),
            "Chat completion"
        );

        let response = self.post(&request).await?;
        let body = Self::parse_json(response).await?;
        parse_chat_body(&body)
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "OpenAI-compatible".to_string(),
            supports_streaming: true,
            supports_functions: true,
        }
    }
}

fn parse_chat_body(body: &serde_json::Value) -> Result<ChatResponse> {
    let choice = &body["choices"][0]["message"];
    if !choice.is_object() {
        return Err(anyhow!("Chat response has no choices[0].message"));
    }

    if let Some(tool_calls) = choice["tool_calls"].as_array() {
        let calls: Vec<ToolCall> = tool_calls
            .iter()
            .filter_map(|tc| {
                Some(ToolCall {
                    id: tc["id"].as_str().unwrap_or_default().to_string(),
                    name: tc["function"]["name"].as_str()?.to_string(),
                    arguments: tc["function"]["arguments"]
                        .as_str()
                        .unwrap_or("{}")
                        .to_string(),
                })
            })
            .collect();
        if !calls.is_empty() {
            return Ok(ChatResponse::ToolCalls(calls));
        }
    }

    choice["content"]
        .as_str()
        .map(|content| ChatResponse::Content(content.to_string()))
        .ok_or_else(|| anyhow!("Chat response has neither content nor tool calls"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_call_body() {
        let body = json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": {"name": "wikipedia", "arguments": "{\"query\":\"Rust\"}"}
                }]
            }}]
        });
        match parse_chat_body(&body).unwrap() {
            ChatResponse::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "wikipedia");
                assert_eq!(calls[0].query(), "Rust");
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_content_body() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Hi"}}]});
        assert_eq!(parse_chat_body(&body).unwrap(), ChatResponse::Content("Hi".into()));
    }

    #[test]
    fn test_parse_body_without_message_is_an_error() {
        assert!(parse_chat_body(&json!({})).is_err());
        assert!(parse_chat_body(&json!({"choices": []})).is_err());
        let no_content = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        assert!(parse_chat_body(&no_content).is_err());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = OpenAiProvider::new("http://localhost:9/v1/", "k".into(), 5).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9/v1/chat/completions");
    }
}

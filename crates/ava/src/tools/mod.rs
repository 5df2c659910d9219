//! Search and content tools the chat model can route a query to.
//!
//! Each tool makes one stateless request, parses it into typed structs and
//! formats the result as markdown (plus HTML for embeds). Tools never touch
//! the session; the dispatcher copies clipboard text and image links into it.

pub mod google;
pub mod maps;
pub mod news;
pub mod spotify;
pub mod tmdb;
pub mod wikipedia;
pub mod wolfram;
pub mod youtube;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::config::ApisConfig;
use crate::error::ApiError;
use crate::llm::ToolSchema;

pub use google::{ImageSearchTool, WebSearchTool};
pub use maps::MapsTool;
pub use news::NewsTool;
pub use spotify::MusicTool;
pub use tmdb::MoviesTool;
pub use wikipedia::WikipediaTool;
pub use wolfram::MathsTool;
pub use youtube::YouTubeTool;

/// What a tool hands back to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolOutput {
    pub markdown: String,
    /// Plain-text rendering for the "Copy" action.
    pub clipboard: Option<String>,
    /// Image links to show under the reply.
    pub images: Vec<String>,
    /// Embed markup (video, map, playlist).
    pub html: Option<String>,
}

impl ToolOutput {
    pub fn markdown(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            ..Default::default()
        }
    }

    pub fn with_clipboard(mut self, clipboard: impl Into<String>) -> Self {
        self.clipboard = Some(clipboard.into());
        self
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in a tool call.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search term"
                }
            },
            "required": ["query"]
        })
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError>;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Shared HTTP client that turns every failure into a typed [`ApiError`].
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
}

impl ApiClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(concat!("ava/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    async fn send(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        // Query strings carry API keys, so errors are reported without the URL
        let response = request.send().await.map_err(|e| ApiError::Transport {
            service,
            message: e.without_url().to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(service, status = status.as_u16(), "API request failed");
            return Err(ApiError::Http {
                service,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(service, request).await?;
        let body = response.text().await.map_err(|e| ApiError::Transport {
            service,
            message: e.without_url().to_string(),
        })?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(service, error = %e, "Malformed API response");
            ApiError::Malformed {
                service,
                message: e.to_string(),
            }
        })
    }

    pub async fn get_bytes(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, ApiError> {
        let response = self.send(service, request).await?;
        let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
            service,
            message: e.without_url().to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    pub async fn get_text(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> Result<String, ApiError> {
        let response = self.send(service, request).await?;
        response.text().await.map_err(|e| ApiError::Transport {
            service,
            message: e.without_url().to_string(),
        })
    }
}

/// Flat table of tools keyed by name. Registering a name again replaces the
/// earlier tool in place.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in tool, configured from `config`.
    pub fn with_defaults(config: &ApisConfig) -> Result<Self> {
        let client = ApiClient::new(config.timeout_secs)?;
        let mut registry = Self::new();
        registry.register(Arc::new(MathsTool::new(client.clone(), config.wolfram.clone())));
        registry.register(Arc::new(ImageSearchTool::new(
            client.clone(),
            config.google_search.clone(),
        )));
        registry.register(Arc::new(WikipediaTool::new(client.clone(), config.wikipedia.clone())));
        registry.register(Arc::new(WebSearchTool::new(
            client.clone(),
            config.google_search.clone(),
        )));
        registry.register(Arc::new(NewsTool::new(client.clone(), config.news.clone())));
        registry.register(Arc::new(MoviesTool::new(client.clone(), config.tmdb.clone())));
        registry.register(Arc::new(YouTubeTool::new(client.clone(), config.youtube.clone())));
        registry.register(Arc::new(MapsTool::new(config.maps.clone())));
        registry.register(Arc::new(MusicTool::new(client, config.spotify.clone())));
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Percent-encode a query the way the search sites expect it in links.
pub(crate) fn encode(query: &str) -> String {
    urlencoding::encode(query).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, &'static str);

    #[async_trait]
    impl Tool for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "fixed"
        }
        async fn run(&self, _query: &str) -> Result<ToolOutput, ApiError> {
            Ok(ToolOutput::markdown(self.1))
        }
    }

    #[tokio::test]
    async fn test_register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Fixed("news", "old")));
        registry.register(Arc::new(Fixed("maths", "m")));
        registry.register(Arc::new(Fixed("news", "new")));

        assert_eq!(registry.names(), vec!["news", "maths"]);
        let out = registry.get("news").unwrap().run("q").await.unwrap();
        assert_eq!(out.markdown, "new");
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_defaults_expose_every_tool_schema() {
        let registry = ToolRegistry::with_defaults(&ApisConfig::default()).unwrap();
        let names = registry.names();
        for expected in [
            "maths",
            "image_search",
            "wikipedia",
            "web_search",
            "news",
            "movies",
            "youtube",
            "maps",
            "music",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
        let schemas = registry.schemas();
        assert!(schemas
            .iter()
            .all(|s| s.parameters["required"][0] == "query"));
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ApiError, ConfigError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvaConfig {
    pub llm: LlmSettings,
    pub token_limits: TokenLimits,
    pub apis: ApisConfig,
    /// Number of words shown in a document preview.
    pub preview_words: usize,
    /// Number of rows shown in a table preview.
    pub table_preview_rows: usize,
    pub knowledgebase_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API, without the `/chat/completions` suffix.
    pub base_url: String,
    pub api_key: Credential,
    pub chat_model: String,
    pub action_model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub streaming: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenLimits {
    pub models: HashMap<String, usize>,
    pub default_token_limit: usize,
}

impl TokenLimits {
    pub fn limit_for(&self, model: &str) -> usize {
        self.models
            .get(model)
            .copied()
            .unwrap_or(self.default_token_limit)
    }
}

/// A secret that is either inlined in the config file or read from an env var.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Credential {
    pub value: Option<String>,
    pub env: String,
}

impl Credential {
    pub fn from_env(env: &str) -> Self {
        Self {
            value: None,
            env: env.to_string(),
        }
    }

    pub fn inline(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            env: String::new(),
        }
    }

    pub fn resolve(&self) -> Option<String> {
        if let Some(ref v) = self.value {
            if !v.is_empty() {
                return Some(v.clone());
            }
        }
        if self.env.is_empty() {
            return None;
        }
        std::env::var(&self.env).ok().filter(|v| !v.is_empty())
    }

    /// Resolve or fail with a [`ApiError::MissingCredential`] naming `service`.
    pub fn require(&self, service: &'static str) -> Result<String, ApiError> {
        self.resolve().ok_or_else(|| ApiError::MissingCredential {
            service,
            env: self.env.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub key: Credential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSearchConfig {
    pub base_url: String,
    pub key: Credential,
    pub engine_id: Credential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub token_url: String,
    pub api_url: String,
    pub embed_url: String,
    pub client_id: Credential,
    pub client_secret: Credential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApisConfig {
    pub timeout_secs: u64,
    pub news: ServiceConfig,
    pub wikipedia: ServiceConfig,
    pub google_search: GoogleSearchConfig,
    pub youtube: ServiceConfig,
    pub maps: ServiceConfig,
    pub tmdb: ServiceConfig,
    pub spotify: SpotifyConfig,
    pub wolfram: ServiceConfig,
}

impl AvaConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(
                "llm.temperature must be in [0.0, 2.0]".into(),
            ));
        }
        if self.llm.chat_model.trim().is_empty() || self.llm.action_model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm model names must not be empty".into()));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid("llm.max_tokens must be > 0".into()));
        }
        if self.token_limits.default_token_limit == 0 {
            return Err(ConfigError::Invalid(
                "token_limits.default_token_limit must be > 0".into(),
            ));
        }
        if self.preview_words == 0 {
            return Err(ConfigError::Invalid("preview_words must be > 0".into()));
        }
        if self.apis.timeout_secs == 0 {
            return Err(ConfigError::Invalid("apis.timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn token_limit(&self, model: &str) -> usize {
        self.token_limits.limit_for(model)
    }
}

impl Default for AvaConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ava");

        Self {
            llm: LlmSettings::default(),
            token_limits: TokenLimits::default(),
            apis: ApisConfig::default(),
            preview_words: 200,
            table_preview_rows: 5,
            knowledgebase_path: data_dir.join("knowledgebase.jsonl"),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: Credential::from_env("OPENAI_API_KEY"),
            chat_model: "gpt-3.5-turbo".to_string(),
            action_model: "gpt-3.5-turbo-16k".to_string(),
            temperature: 1.0,
            max_tokens: 1024,
            streaming: true,
            timeout_secs: 300,
        }
    }
}

impl Default for TokenLimits {
    fn default() -> Self {
        let models = [
            ("gpt-3.5-turbo", 4096),
            ("gpt-3.5-turbo-16k", 16384),
            ("gpt-4", 8192),
            ("gpt-4-32k", 32768),
        ]
        .into_iter()
        .map(|(name, limit)| (name.to_string(), limit))
        .collect();

        Self {
            models,
            default_token_limit: 4096,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            key: Credential::default(),
        }
    }
}

impl ServiceConfig {
    fn new(base_url: &str, key_env: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            key: if key_env.is_empty() {
                Credential::default()
            } else {
                Credential::from_env(key_env)
            },
        }
    }
}

impl Default for GoogleSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://customsearch.googleapis.com".to_string(),
            key: Credential::from_env("GOOGLE_SEARCH_API_KEY"),
            engine_id: Credential::from_env("GOOGLE_SEARCH_ENGINE_ID"),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_url: "https://api.spotify.com".to_string(),
            embed_url: "https://open.spotify.com/oembed".to_string(),
            client_id: Credential::from_env("SPOTIFY_CLIENT_ID"),
            client_secret: Credential::from_env("SPOTIFY_CLIENT_SECRET"),
        }
    }
}

impl Default for ApisConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            news: ServiceConfig::new("https://newsapi.org", "NEWS_API_KEY"),
            wikipedia: ServiceConfig::new("https://en.wikipedia.org/api/rest_v1", ""),
            google_search: GoogleSearchConfig::default(),
            youtube: ServiceConfig::new("https://www.googleapis.com", "YOUTUBE_API_KEY"),
            maps: ServiceConfig::new("https://www.google.com/maps", "GOOGLE_MAPS_API_KEY"),
            tmdb: ServiceConfig::new("https://api.themoviedb.org", "TMDB_API_KEY"),
            spotify: SpotifyConfig::default(),
            wolfram: ServiceConfig::new("https://api.wolframalpha.com", "WOLFRAM_APP_ID"),
        }
    }
}

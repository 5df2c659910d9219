pub mod capabilities;
pub mod clipboard;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod knowledgebase;
pub mod llm;
pub mod processing;
pub mod prompts;
pub mod session;
pub mod tokens;
pub mod tools;
pub mod types;
pub mod web;
pub mod wordcloud;

// Re-export primary types for convenience
pub use capabilities::{generate_actions, ActionDescriptor, ActionPayload, Capability};
pub use config::AvaConfig;
pub use dispatcher::{ActionDispatcher, EventEmitter, NoopEmitter};
pub use error::{ApiError, ConfigError, ExtractError};
pub use session::{Session, SessionId, SessionManager};
pub use types::{Element, InboundEvent, IntentHint, MediaType, Reply, ReplyKind, UploadedFile};

// Re-export LLM types
pub use llm::{
    ChatResponse, GenerationConfig, LlmProvider, MockProvider, OpenAiProvider, ProviderInfo,
    ToolCall,
};

// Re-export common types
pub use anyhow::{Error, Result};
pub use uuid::Uuid;

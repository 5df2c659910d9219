//! Per-conversation state.
//!
//! A [`Session`] is handed `&mut` to every handler call; nothing reaches it
//! through ambient lookup. [`SessionManager`] keeps one mutex per session so
//! events for the same conversation run strictly one after another.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::config::AvaConfig;
use crate::processing::Table;

pub type SessionId = Uuid;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    /// Content that free-text messages are answered against while set.
    pub question_context: Option<String>,
    /// Text of the last uploaded document or fetched page.
    pub document_text: Option<String>,
    /// Plain-text copy of the last tool result, consumed by "Copy".
    pub clipboard: Option<String>,
    /// Links from the last image search.
    pub images: Vec<String>,
    /// Last generated word cloud or uploaded image.
    pub image: Option<Vec<u8>>,
    pub table: Option<Table>,
    pub chat_model: String,
    pub action_model: String,
    values: HashMap<String, JsonValue>,
}

impl Session {
    pub fn new(chat_model: impl Into<String>, action_model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            question_context: None,
            document_text: None,
            clipboard: None,
            images: Vec::new(),
            image: None,
            table: None,
            chat_model: chat_model.into(),
            action_model: action_model.into(),
            values: HashMap::new(),
        }
    }

    pub fn from_config(config: &AvaConfig) -> Self {
        Self::new(config.llm.chat_model.clone(), config.llm.action_model.clone())
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.values.remove(key)
    }
}

/// Owns every open session.
#[derive(Default)]
pub struct SessionManager {
    sessions: DashMap<SessionId, Arc<AsyncMutex<Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation and return its handle.
    pub fn open(&self, session: Session) -> SessionId {
        let id = session.id;
        self.sessions.insert(id, Arc::new(AsyncMutex::new(session)));
        tracing::info!(session = %id, "Session opened");
        id
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<AsyncMutex<Session>>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// End a conversation, discarding everything it held.
    pub fn close(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Session closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

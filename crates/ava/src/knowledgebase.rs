//! Append-only store behind the "Save" action.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeKind {
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub kind: KnowledgeKind,
    /// Text as-is; images base64-encoded.
    pub content: String,
}

impl KnowledgeRecord {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            kind: KnowledgeKind::Text,
            content: text.into(),
        }
    }

    pub fn image(bytes: &[u8]) -> Self {
        Self {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            kind: KnowledgeKind::Image,
            content: STANDARD.encode(bytes),
        }
    }

    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        match self.kind {
            KnowledgeKind::Image => STANDARD.decode(&self.content).ok(),
            KnowledgeKind::Text => None,
        }
    }
}

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn save(&self, record: KnowledgeRecord) -> Result<()>;
}

/// One JSON record per line.
pub struct JsonlKnowledgeBase {
    path: PathBuf,
}

impl JsonlKnowledgeBase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every saved record, oldest first. A missing file is an empty store.
    pub async fn load_all(&self) -> Result<Vec<KnowledgeRecord>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };

        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).context("malformed knowledgebase record"))
            .collect()
    }
}

#[async_trait]
impl KnowledgeBase for JsonlKnowledgeBase {
    async fn save(&self, record: KnowledgeRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(id = %record.id, kind = ?record.kind, "Saved to knowledgebase");
        Ok(())
    }
}

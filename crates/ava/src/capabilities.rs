//! Capability registry: the follow-up actions offered under a reply.
//!
//! Every capability has a stable key (what callers ask for), a label (the
//! action name a clicked button resubmits) and a description.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Question,
    AnotherQuestion,
    EndQuestions,
    Summarise,
    BulletpointSummary,
    CreateWordcloud,
    GetQuotes,
    GetThemes,
    GetInsights,
    Copy,
    SaveToKnowledgebase,
    UploadFile,
    GetWebsiteContent,
}

/// Static display record for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

pub const ALL_CAPABILITIES: [Capability; 13] = [
    Capability::Question,
    Capability::AnotherQuestion,
    Capability::EndQuestions,
    Capability::Summarise,
    Capability::BulletpointSummary,
    Capability::CreateWordcloud,
    Capability::GetQuotes,
    Capability::GetThemes,
    Capability::GetInsights,
    Capability::Copy,
    Capability::SaveToKnowledgebase,
    Capability::UploadFile,
    Capability::GetWebsiteContent,
];

impl Capability {
    pub fn descriptor(&self) -> CapabilityDescriptor {
        let (key, label, description) = match self {
            Self::Question => ("question", "Question", "Ask a question about this content"),
            Self::AnotherQuestion => (
                "another_question",
                "Another Question",
                "Ask another question",
            ),
            Self::EndQuestions => ("end_questions", "End Questions", "Stop asking questions"),
            Self::Summarise => ("summarise", "Summarise", "Write a detailed summary"),
            Self::BulletpointSummary => (
                "bulletpoint_summary",
                "Bulletpoints",
                "Write a bullet point summary",
            ),
            Self::CreateWordcloud => ("create_wordcloud", "Wordcloud", "Create a wordcloud"),
            Self::GetQuotes => ("get_quotes", "Quotes", "Pull out any quotes"),
            Self::GetThemes => ("get_themes", "Themes", "List the main themes"),
            Self::GetInsights => ("get_insights", "Get Insights", "Analyse the data for insights"),
            Self::Copy => ("copy", "Copy", "Copy to clipboard"),
            Self::SaveToKnowledgebase => (
                "save_to_knowledgebase",
                "Save",
                "Save to your knowledgebase",
            ),
            Self::UploadFile => ("upload_file", "Upload File", "Upload a file"),
            Self::GetWebsiteContent => (
                "get_website_content",
                "Get Website Content",
                "Get the content of this webpage",
            ),
        };
        CapabilityDescriptor {
            key,
            label,
            description,
        }
    }

    pub fn key(&self) -> &'static str {
        self.descriptor().key
    }

    pub fn label(&self) -> &'static str {
        self.descriptor().label
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ALL_CAPABILITIES.iter().copied().find(|c| c.key() == key)
    }

    /// Map a clicked button's action name back to its capability.
    pub fn from_action_name(name: &str) -> Option<Self> {
        ALL_CAPABILITIES.iter().copied().find(|c| c.label() == name)
    }
}

/// Value carried by an action button and resubmitted when it is clicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ActionPayload {
    Text(String),
    Image(Vec<u8>),
    /// Use whatever the session clipboard holds at click time.
    SessionClipboard,
}

impl ActionPayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for ActionPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ActionPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDescriptor {
    pub capability: Capability,
    pub name: String,
    pub value: ActionPayload,
    pub description: String,
}

impl ActionDescriptor {
    pub fn new(capability: Capability, value: ActionPayload) -> Self {
        let descriptor = capability.descriptor();
        Self {
            capability,
            name: descriptor.label.to_string(),
            value,
            description: descriptor.description.to_string(),
        }
    }
}

/// Build the offered actions for `keys`, in order. Unknown keys are skipped
/// and each action gets its own copy of the payload.
pub fn generate_actions(payload: &ActionPayload, keys: &[&str]) -> Vec<ActionDescriptor> {
    keys.iter()
        .filter_map(|key| {
            let capability = Capability::from_key(key);
            if capability.is_none() {
                tracing::debug!(key = %key, "Skipping unknown capability key");
            }
            capability
        })
        .map(|capability| ActionDescriptor::new(capability, payload.clone()))
        .collect()
}

pub fn generate_for(payload: &ActionPayload, capabilities: &[Capability]) -> Vec<ActionDescriptor> {
    capabilities
        .iter()
        .map(|capability| ActionDescriptor::new(*capability, payload.clone()))
        .collect()
}

/// Canonical action sets offered under each kind of reply.
pub mod offered {
    use super::Capability::{self, *};

    pub const DOCUMENT: &[Capability] = &[
        Question,
        Summarise,
        BulletpointSummary,
        CreateWordcloud,
        GetQuotes,
        GetThemes,
        Copy,
        SaveToKnowledgebase,
        UploadFile,
    ];
    pub const TABLE: &[Capability] = &[Question, GetInsights, UploadFile];
    pub const ANSWER: &[Capability] = &[Copy, SaveToKnowledgebase, UploadFile];
    pub const QUESTION_ANSWER: &[Capability] = &[AnotherQuestion, EndQuestions, Copy, UploadFile];
    pub const IMAGE: &[Capability] = &[SaveToKnowledgebase, UploadFile];
    pub const TOOL_RESULT: &[Capability] = &[Copy, SaveToKnowledgebase, UploadFile];
    pub const AFTER_SAVE: &[Capability] = &[UploadFile];
}

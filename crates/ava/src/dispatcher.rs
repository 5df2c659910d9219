//! Routes every inbound event for a session to the handler that answers it.
//!
//! Free-text messages go through a fixed priority order (pending question,
//! URL, upload keyword, general query). Clicked actions are matched
//! exhaustively on [`Capability`]. Uploads are extracted and measured against
//! the session's action model. Every user-visible failure becomes a [`Reply`]
//! with a non-normal [`ReplyKind`]; `Err` is left for infrastructure faults.

use anyhow::Result;
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};

use crate::capabilities::{generate_for, offered, ActionPayload, Capability};
use crate::clipboard::{Clipboard, MemoryClipboard};
use crate::config::AvaConfig;
use crate::error::ApiError;
use crate::knowledgebase::{JsonlKnowledgeBase, KnowledgeBase, KnowledgeRecord};
use crate::llm::{ChatMessage, ChatResponse, GenerationConfig, LlmProvider};
use crate::processing::{ContentExtractor, ExtractedDocument, Extraction};
use crate::prompts;
use crate::session::Session;
use crate::tokens::{format_thousands, TokenBudget};
use crate::tools::ToolRegistry;
use crate::types::{Element, InboundEvent, IntentHint, MediaType, Reply, ReplyKind, UploadedFile};
use crate::web::{find_url, PageKind, WebFetcher};
use crate::wordcloud::{WordCloud, SVG_MIME};

/// Receives incremental output while a handler runs.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &str, data: serde_json::Value);
}

/// No-op emitter for non-streaming contexts.
pub struct NoopEmitter;
impl EventEmitter for NoopEmitter {
    fn emit(&self, _event: &str, _data: serde_json::Value) {}
}

static NEWS_TOPIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnews\s+(?:about|on|for|regarding|around)\s+(.+)").expect("valid news pattern")
});

const NEWS_FILLER: &[&str] = &[
    "search", "find", "show", "get", "give", "me", "for", "the", "latest", "recent", "news", "any",
    "some", "what's", "whats",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadRequest {
    Document,
    Image,
}

pub struct ActionDispatcher {
    config: Arc<AvaConfig>,
    llm: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    fetcher: WebFetcher,
    extractor: ContentExtractor,
    wordcloud: WordCloud,
    clipboard: Arc<dyn Clipboard>,
    knowledgebase: Arc<dyn KnowledgeBase>,
}

impl ActionDispatcher {
    /// Dispatcher with every built-in tool, an in-process clipboard and the
    /// JSONL knowledgebase at `config.knowledgebase_path`.
    pub fn new(config: Arc<AvaConfig>, llm: Arc<dyn LlmProvider>) -> Result<Self> {
        let tools = ToolRegistry::with_defaults(&config.apis)?;
        let fetcher = WebFetcher::with_timeout(config.apis.timeout_secs)?;
        let knowledgebase = Arc::new(JsonlKnowledgeBase::new(config.knowledgebase_path.clone()));

        Ok(Self {
            extractor: ContentExtractor::from_config(&config),
            wordcloud: WordCloud::new(),
            clipboard: Arc::new(MemoryClipboard::new()),
            knowledgebase,
            tools,
            fetcher,
            llm,
            config,
        })
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_knowledgebase(mut self, knowledgebase: Arc<dyn KnowledgeBase>) -> Self {
        self.knowledgebase = knowledgebase;
        self
    }

    pub fn with_fetcher(mut self, fetcher: WebFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn config(&self) -> &AvaConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn handle(
        &self,
        session: &mut Session,
        event: InboundEvent,
        emitter: &dyn EventEmitter,
    ) -> Result<Reply> {
        match event {
            InboundEvent::Message { text, intent } => {
                self.on_message(session, &text, intent, emitter).await
            }
            InboundEvent::Action { capability, value } => {
                tracing::info!(action = %capability.key(), "Running action");
                self.on_action(session, capability, value, emitter).await
            }
            InboundEvent::Upload(file) => Ok(self.on_upload(session, &file)),
        }
    }

    // ========================================================================
    // Messages
    // ========================================================================

    async fn on_message(
        &self,
        session: &mut Session,
        text: &str,
        intent: Option<IntentHint>,
        emitter: &dyn EventEmitter,
    ) -> Result<Reply> {
        if let Some(context) = session.question_context.clone() {
            tracing::info!("Answering question against stored content");
            return Ok(self.answer_question(session, &context, text, emitter).await);
        }

        if let Some(url) = find_url(text) {
            tracing::info!(url = %url, "Offering to fetch URL");
            return Ok(Reply::text(format!("You gave me a URL to search : {}", url)).with_actions(
                generate_for(&ActionPayload::Text(url), &[Capability::GetWebsiteContent]),
            ));
        }

        if let Some(request) = upload_keyword(text) {
            tracing::info!(request = ?request, "Asking for an upload");
            return Ok(match request {
                UploadRequest::Image => {
                    Reply::request_upload("Please upload your image", MediaType::images())
                }
                UploadRequest::Document => upload_prompt(),
            });
        }

        if intent == Some(IntentHint::LatestNews) {
            let topic = news_topic(text);
            tracing::info!(topic = %topic, "Latest news intent");
            return Ok(self.run_tool(session, "news", &topic).await);
        }

        Ok(self.general_query(session, text, emitter).await)
    }

    async fn general_query(
        &self,
        session: &mut Session,
        text: &str,
        emitter: &dyn EventEmitter,
    ) -> Reply {
        let model = session.chat_model.clone();
        let cfg = GenerationConfig::for_model(&self.config.llm, &model);

        if self.tools.is_empty() {
            return match self.complete(text, &model, emitter).await {
                Ok(answer) => Reply::text(answer),
                Err(e) => llm_failure(&model, e),
            };
        }

        let messages = [
            ChatMessage::system(prompts::CHAT_SYSTEM_PROMPT),
            ChatMessage::user(text),
        ];
        let response = match self.llm.chat(&messages, &self.tools.schemas(), &cfg).await {
            Ok(response) => response,
            Err(e) => return llm_failure(&model, e),
        };

        match response {
            ChatResponse::ToolCalls(calls) => {
                let Some(call) = calls.into_iter().next() else {
                    return Reply::text("Sorry, I didn't understand that. Could you rephrase it?");
                };
                let query = call.query();
                let query = if query.trim().is_empty() {
                    text.to_string()
                } else {
                    query
                };
                tracing::info!(tool = %call.name, query = %query, "Model chose a tool");
                self.run_tool(session, &call.name, &query).await
            }
            ChatResponse::Content(answer) => {
                emitter.emit("complete", json!({ "content": &answer }));
                Reply::text(answer)
            }
        }
    }

    async fn answer_question(
        &self,
        session: &mut Session,
        context: &str,
        question: &str,
        emitter: &dyn EventEmitter,
    ) -> Reply {
        let model = session.action_model.clone();
        let prompt = prompts::question(context, question);
        if let Some(reply) = self.check_budget(&prompt, &model) {
            return reply;
        }

        match self.complete(&prompt, &model, emitter).await {
            Ok(answer) => {
                let actions = generate_for(&ActionPayload::Text(answer.clone()), offered::QUESTION_ANSWER);
                Reply::text(answer).with_actions(actions)
            }
            Err(e) => llm_failure(&model, e),
        }
    }

    async fn run_tool(&self, session: &mut Session, name: &str, query: &str) -> Reply {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = %name, "Model asked for an unknown tool");
            return Reply::text(format!("Sorry, I don't have a {} tool.", name))
                .with_kind(ReplyKind::ApiFailure);
        };

        tracing::info!(tool = %name, query = %query, "Running tool");
        let output = match tool.run(query).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(service = e.service(), error = %e, "Tool request failed");
                return Reply::text(api_apology(&e, query)).with_kind(ReplyKind::ApiFailure);
            }
        };

        session.clipboard = output.clipboard.clone();
        if !output.images.is_empty() {
            session.images = output.images.clone();
        }

        // Each action carries its own copy of the result text
        let payload = ActionPayload::Text(
            output
                .clipboard
                .clone()
                .unwrap_or_else(|| output.markdown.clone()),
        );
        let mut reply = Reply::text(output.markdown.clone())
            .with_actions(generate_for(&payload, offered::TOOL_RESULT));
        for (idx, url) in output.images.iter().enumerate() {
            if !output.markdown.contains(url.as_str()) {
                reply = reply.with_element(Element::ImageUrl {
                    name: format!("Image {}", idx + 1),
                    url: url.clone(),
                });
            }
        }
        if let Some(html) = output.html {
            reply = reply.with_element(Element::Html { content: html });
        }
        reply
    }

    // ========================================================================
    // Actions
    // ========================================================================

    async fn on_action(
        &self,
        session: &mut Session,
        capability: Capability,
        value: ActionPayload,
        emitter: &dyn EventEmitter,
    ) -> Result<Reply> {
        let reply = match capability {
            Capability::GetWebsiteContent => self.fetch_website(session, &value).await,
            Capability::Question | Capability::AnotherQuestion => {
                if session.question_context.is_none() {
                    session.question_context = payload_text(session, &value);
                }
                if capability == Capability::Question {
                    Reply::text("**Enter your question below ↓**")
                } else {
                    Reply::text("**Enter your question below:**")
                }
            }
            Capability::EndQuestions => {
                session.question_context = None;
                Reply::text("**Questions ended**")
            }
            Capability::Summarise
            | Capability::BulletpointSummary
            | Capability::GetThemes
            | Capability::GetQuotes => {
                self.content_action(session, capability, &value, emitter)
                    .await
            }
            Capability::GetInsights => self.insights(session, emitter).await,
            Capability::CreateWordcloud => self.create_wordcloud(session, &value),
            Capability::Copy => self.copy(session, value),
            Capability::SaveToKnowledgebase => self.save(session, value).await,
            Capability::UploadFile => upload_prompt(),
        };
        Ok(reply)
    }

    async fn fetch_website(&self, session: &mut Session, value: &ActionPayload) -> Reply {
        let Some(url) = value.as_text() else {
            return Reply::text("There's no URL to fetch.").with_kind(ReplyKind::Unsupported);
        };

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to fetch page");
                return Reply::text(format!(
                    "Sorry, I couldn't get the content of {}. Please check the link and try again.",
                    url
                ))
                .with_kind(ReplyKind::ApiFailure);
            }
        };

        let label = page.kind.label();
        let heading = match (page.kind, page.title.as_deref()) {
            (PageKind::Webpage, Some(title)) => format!("The webpage \"{}\"", title),
            (PageKind::Webpage, None) => "The webpage".to_string(),
            (PageKind::Pdf, _) => "The PDF".to_string(),
        };
        let preview = crate::processing::preview(&page.text, self.config.preview_words);
        self.document_reply(session, &heading, page.text, preview, label)
    }

    async fn content_action(
        &self,
        session: &mut Session,
        capability: Capability,
        value: &ActionPayload,
        emitter: &dyn EventEmitter,
    ) -> Reply {
        let Some(content) = payload_text(session, value) else {
            return Reply::text("There's no text to work with here.")
                .with_kind(ReplyKind::Unsupported);
        };

        let prompt = match capability {
            Capability::Summarise => prompts::summary(&content),
            Capability::BulletpointSummary => prompts::bulletpoint_summary(&content),
            Capability::GetThemes => prompts::themes(&content),
            _ => prompts::quotes(&content),
        };

        let model = session.action_model.clone();
        if let Some(reply) = self.check_budget(&prompt, &model) {
            return reply;
        }

        let answer = match self.complete(&prompt, &model, emitter).await {
            Ok(answer) => answer,
            Err(e) => return llm_failure(&model, e),
        };

        let actions = generate_for(&ActionPayload::Text(answer.clone()), offered::ANSWER);
        let content = match capability {
            Capability::GetThemes => format!("## Here are the themes:\n\n{}", answer),
            Capability::GetQuotes if !answer.contains(prompts::NO_QUOTES) => {
                format!("## Here are your quotes:\n\n{}", answer)
            }
            _ => answer,
        };
        Reply::text(content).with_actions(actions)
    }

    async fn insights(&self, session: &mut Session, emitter: &dyn EventEmitter) -> Reply {
        let Some(table) = session.table.as_ref() else {
            return Reply::text("There's no data to analyse yet. Upload a CSV or XLSX file first.")
                .with_kind(ReplyKind::Unsupported);
        };

        let prompt = prompts::insights(table);
        let model = session.action_model.clone();
        if let Some(reply) = self.check_budget(&prompt, &model) {
            return reply;
        }

        match self.complete(&prompt, &model, emitter).await {
            Ok(answer) => {
                let actions = generate_for(&ActionPayload::Text(answer.clone()), offered::ANSWER);
                Reply::text(answer).with_actions(actions)
            }
            Err(e) => llm_failure(&model, e),
        }
    }

    fn create_wordcloud(&self, session: &mut Session, value: &ActionPayload) -> Reply {
        let Some(text) = payload_text(session, value) else {
            return Reply::text("There's no text to make a wordcloud from.")
                .with_kind(ReplyKind::Unsupported);
        };

        let Some(svg) = self.wordcloud.render_svg(&text) else {
            return Reply::text("There aren't enough words in this content to make a wordcloud.")
                .with_kind(ReplyKind::Unsupported);
        };

        tracing::info!(bytes = svg.len(), "Rendered wordcloud");
        session.image = Some(svg.clone());
        Reply::text("Here's your wordcloud:")
            .with_element(Element::Image {
                name: "Wordcloud".to_string(),
                mime: SVG_MIME.to_string(),
                bytes: svg.clone(),
            })
            .with_actions(generate_for(&ActionPayload::Image(svg), offered::IMAGE))
    }

    fn copy(&self, session: &Session, value: ActionPayload) -> Reply {
        let Some(text) = payload_text(session, &value) else {
            return Reply::text("There's nothing to copy.").with_kind(ReplyKind::Unsupported);
        };

        if let Err(e) = self.clipboard.set_text(&text) {
            tracing::error!(error = %e, "Failed to write clipboard");
            return Reply::text("Sorry, I couldn't copy that to your clipboard.")
                .with_kind(ReplyKind::ApiFailure);
        }
        tracing::info!(chars = text.chars().count(), "Copied to clipboard");
        Reply::text("**Text copied to clipboard**").with_actions(generate_for(
            &ActionPayload::SessionClipboard,
            offered::AFTER_SAVE,
        ))
    }

    async fn save(&self, session: &Session, value: ActionPayload) -> Reply {
        let record = match &value {
            ActionPayload::Text(text) => Some(KnowledgeRecord::text(text.clone())),
            ActionPayload::Image(bytes) => Some(KnowledgeRecord::image(bytes)),
            ActionPayload::SessionClipboard => {
                payload_text(session, &value).map(KnowledgeRecord::text)
            }
        };
        let Some(record) = record else {
            return Reply::text("There's nothing to save.").with_kind(ReplyKind::Unsupported);
        };

        if let Err(e) = self.knowledgebase.save(record).await {
            tracing::error!(error = %e, "Failed to save to knowledgebase");
            return Reply::text("Sorry, I couldn't save that to your knowledgebase.")
                .with_kind(ReplyKind::ApiFailure);
        }
        Reply::text("**Knowledge Saved!**").with_actions(generate_for(
            &ActionPayload::SessionClipboard,
            offered::AFTER_SAVE,
        ))
    }

    // ========================================================================
    // Uploads
    // ========================================================================

    fn on_upload(&self, session: &mut Session, file: &UploadedFile) -> Reply {
        tracing::info!(file = %file.name, mime = %file.mime, bytes = file.bytes.len(), "Upload received");

        let content = match self.extractor.extract_upload(file) {
            Ok(Extraction::Supported(content)) => content,
            Ok(Extraction::Unsupported { mime }) => {
                return Reply::text(format!(
                    "Unsupported file type uploaded: `{}` is {}.",
                    file.name, mime
                ))
                .with_kind(ReplyKind::Unsupported);
            }
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "Failed to extract upload");
                return Reply::text(format!("Sorry, I couldn't read `{}`: {}", file.name, e))
                    .with_kind(ReplyKind::Unsupported);
            }
        };

        let model = session.action_model.clone();
        let limit = self.config.token_limit(&model);
        match ExtractedDocument::measure(content, &model, limit) {
            ExtractedDocument::Text {
                text,
                preview,
                token_count,
                token_limit,
                ..
            } => {
                let budget = TokenBudget {
                    model: model.clone(),
                    tokens: token_count,
                    limit: token_limit,
                };
                let content = format!(
                    "`{}` uploaded, it contains {} characters which is c.{} tokens. You're currently using the {} model which has a token limit of {}. {}",
                    file.name,
                    format_thousands(text.chars().count()),
                    format_thousands(token_count),
                    model,
                    format_thousands(token_limit),
                    budget.status_line()
                );
                let actions = generate_for(&ActionPayload::Text(text.clone()), offered::DOCUMENT);
                session.document_text = Some(text);
                with_preview(Reply::text(content), &preview, self.config.preview_words, "document")
                    .with_actions(actions)
            }
            ExtractedDocument::Table {
                table,
                preview_markdown,
            } => {
                let content = format!(
                    "`{}` uploaded. It has {} rows and {} columns.",
                    file.name,
                    table.row_count(),
                    table.column_count()
                );
                let csv_text = match table.to_csv_text() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(file = %file.name, error = %e, "Failed to render table as CSV");
                        return Reply::text(format!("Sorry, I couldn't read `{}`: {}", file.name, e))
                            .with_kind(ReplyKind::Unsupported);
                    }
                };
                let shown = table.row_count().min(self.config.table_preview_rows);
                let actions = generate_for(&ActionPayload::Text(csv_text), offered::TABLE);
                session.table = Some(table);
                Reply::text(content)
                    .with_element(Element::Text {
                        name: format!("Here are the top {} rows of data:", shown),
                        content: preview_markdown,
                    })
                    .with_actions(actions)
            }
            ExtractedDocument::Image { bytes, format } => {
                session.image = Some(bytes.clone());
                Reply::text("Here's your image:")
                    .with_element(Element::Image {
                        name: file.name.clone(),
                        mime: format.mime().to_string(),
                        bytes: bytes.clone(),
                    })
                    .with_actions(generate_for(&ActionPayload::Image(bytes), offered::IMAGE))
            }
        }
    }

    /// Upload-style reply for text that arrived some other way (a fetched
    /// page or PDF link).
    fn document_reply(
        &self,
        session: &mut Session,
        heading: &str,
        text: String,
        preview: String,
        label: &str,
    ) -> Reply {
        let model = session.action_model.clone();
        let budget = TokenBudget::measure(&text, &model, self.config.token_limit(&model));
        let content = format!(
            "{} contains {} characters which is c.{} tokens. You're currently using the {} model which has a token limit of {}. {}",
            heading,
            format_thousands(text.chars().count()),
            format_thousands(budget.tokens),
            model,
            format_thousands(budget.limit),
            budget.status_line()
        );
        let actions = generate_for(&ActionPayload::Text(text.clone()), offered::DOCUMENT);
        session.document_text = Some(text);
        with_preview(Reply::text(content), &preview, self.config.preview_words, label)
            .with_actions(actions)
    }

    // ========================================================================
    // LLM helpers
    // ========================================================================

    fn check_budget(&self, prompt: &str, model: &str) -> Option<Reply> {
        let budget = TokenBudget::measure(prompt, model, self.config.token_limit(model));
        if !budget.is_over() {
            return None;
        }
        tracing::warn!(
            model = %model,
            tokens = budget.tokens,
            limit = budget.limit,
            "Prompt over token limit, not calling the model"
        );
        Some(Reply::text(budget.capacity_message()).with_kind(ReplyKind::CapacityExceeded))
    }

    /// One completion, streamed to `emitter` token by token when streaming is
    /// on.
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        emitter: &dyn EventEmitter,
    ) -> Result<String> {
        let cfg = GenerationConfig::for_model(&self.config.llm, model);
        tracing::debug!(model = %model, stream = cfg.stream, "Calling LLM");

        if !cfg.stream {
            return self.llm.generate(prompt, &cfg).await;
        }

        let mut stream = self.llm.generate_stream(prompt, &cfg).await?;
        let mut accumulated = String::new();
        while let Some(token) = stream.next().await {
            accumulated.push_str(&token);
            emitter.emit("token", json!({ "token": token }));
        }
        emitter.emit("complete", json!({ "content": &accumulated }));
        Ok(accumulated)
    }
}

fn upload_prompt() -> Reply {
    Reply::request_upload("Please upload a document to begin!", MediaType::documents())
}

fn with_preview(reply: Reply, preview: &str, words: usize, label: &str) -> Reply {
    if preview.is_empty() {
        return reply;
    }
    reply.with_element(Element::Text {
        name: format!("Here are the first {} words from the {}:", words, label),
        content: preview.to_string(),
    })
}

/// Text behind an action payload. `SessionClipboard` reads the current
/// clipboard, then the current document, without clearing either.
fn payload_text(session: &Session, value: &ActionPayload) -> Option<String> {
    match value {
        ActionPayload::Text(text) => Some(text.clone()),
        ActionPayload::SessionClipboard => session
            .clipboard
            .clone()
            .filter(|c| !c.is_empty())
            .or_else(|| session.document_text.clone()),
        ActionPayload::Image(_) => None,
    }
    .filter(|text| !text.trim().is_empty())
}

fn upload_keyword(text: &str) -> Option<UploadRequest> {
    let mut request = None;
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
    {
        match word.as_str() {
            "image" | "images" | "picture" | "photo" => return Some(UploadRequest::Image),
            "file" | "files" | "document" | "documents" => request = Some(UploadRequest::Document),
            _ => {}
        }
    }
    request
}

/// "search for news about wildfires" -> "wildfires"
fn news_topic(text: &str) -> String {
    let trim = |s: &str| s.trim().trim_end_matches(['?', '.', '!']).trim().to_string();

    if let Some(topic) = NEWS_TOPIC.captures(text).and_then(|c| c.get(1)) {
        let topic = trim(topic.as_str());
        if !topic.is_empty() {
            return topic;
        }
    }

    let topic = text
        .split_whitespace()
        .filter(|w| !NEWS_FILLER.contains(&w.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    let topic = trim(&topic);
    if topic.is_empty() {
        trim(text)
    } else {
        topic
    }
}

fn api_apology(error: &ApiError, query: &str) -> String {
    match error {
        ApiError::Empty { .. } => format!("Sorry, I couldn't find anything for \"{}\".", query),
        ApiError::MissingCredential { service, env } => format!(
            "Sorry, the {} tool isn't set up yet. Set {} and try again.",
            service, env
        ),
        other => format!(
            "Sorry, I couldn't reach the {} service just now. Please try again later.",
            other.service()
        ),
    }
}

fn llm_failure(model: &str, error: anyhow::Error) -> Reply {
    tracing::error!(model = %model, error = %error, "LLM call failed");
    Reply::text(format!(
        "Sorry, I couldn't get an answer from {} just now. Please try again.",
        model
    ))
    .with_kind(ReplyKind::ApiFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_topic_extraction() {
        assert_eq!(news_topic("search for news about wildfires"), "wildfires");
        assert_eq!(news_topic("Any news on the Mars rover?"), "the Mars rover");
        assert_eq!(news_topic("latest climate news"), "climate");
        assert_eq!(news_topic("news"), "news");
    }

    #[test]
    fn test_upload_keywords_are_whole_words() {
        assert_eq!(upload_keyword("Can I upload a FILE?"), Some(UploadRequest::Document));
        assert_eq!(upload_keyword("here's my document"), Some(UploadRequest::Document));
        assert_eq!(upload_keyword("show this image file"), Some(UploadRequest::Image));
        assert_eq!(upload_keyword("my profile is imaginative"), None);
        assert_eq!(upload_keyword("what is a filesystem"), None);
    }

    #[test]
    fn test_payload_text_prefers_clipboard_then_document() {
        let mut session = Session::new("chat", "action");
        assert_eq!(payload_text(&session, &ActionPayload::SessionClipboard), None);

        session.document_text = Some("doc".into());
        assert_eq!(
            payload_text(&session, &ActionPayload::SessionClipboard).as_deref(),
            Some("doc")
        );

        session.clipboard = Some("clip".into());
        assert_eq!(
            payload_text(&session, &ActionPayload::SessionClipboard).as_deref(),
            Some("clip")
        );
        assert_eq!(payload_text(&session, &ActionPayload::Text("  ".into())), None);
        assert_eq!(payload_text(&session, &ActionPayload::Image(vec![1])), None);
    }

    #[test]
    fn test_api_apology_never_mentions_urls() {
        let err = ApiError::Http {
            service: "news",
            status: 500,
        };
        assert_eq!(
            api_apology(&err, "q"),
            "Sorry, I couldn't reach the news service just now. Please try again later."
        );
        let empty = ApiError::Empty { service: "news" };
        assert!(api_apology(&empty, "wildfires").contains("\"wildfires\""));
    }
}

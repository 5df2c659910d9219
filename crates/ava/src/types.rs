use serde::{Deserialize, Serialize};

use crate::capabilities::{ActionDescriptor, ActionPayload, Capability};

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_CSV: &str = "text/csv";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Gif,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }
}

/// The fixed set of upload types the assistant understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    PlainText,
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Csv,
    Image(ImageFormat),
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        // Drop parameters such as "; charset=utf-8"
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            MIME_TEXT => Some(Self::PlainText),
            MIME_PDF => Some(Self::Pdf),
            MIME_DOCX => Some(Self::Docx),
            MIME_PPTX => Some(Self::Pptx),
            MIME_XLSX => Some(Self::Xlsx),
            MIME_CSV => Some(Self::Csv),
            "image/jpeg" | "image/jpg" => Some(Self::Image(ImageFormat::Jpeg)),
            "image/gif" => Some(Self::Image(ImageFormat::Gif)),
            "image/png" => Some(Self::Image(ImageFormat::Png)),
            "image/webp" => Some(Self::Image(ImageFormat::Webp)),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "jpg" | "jpeg" => Some(Self::Image(ImageFormat::Jpeg)),
            "gif" => Some(Self::Image(ImageFormat::Gif)),
            "png" => Some(Self::Image(ImageFormat::Png)),
            "webp" => Some(Self::Image(ImageFormat::Webp)),
            _ => None,
        }
    }

    /// Resolve the media type of an upload: the declared MIME type first, then
    /// the file extension when the client only sent a generic type.
    pub fn detect(mime: &str, file_name: &str) -> Option<Self> {
        Self::from_mime(mime).or_else(|| {
            let generic = mime.is_empty() || mime.starts_with("application/octet-stream");
            if !generic {
                return None;
            }
            std::path::Path::new(file_name)
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Self::from_extension)
        })
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::PlainText => MIME_TEXT,
            Self::Pdf => MIME_PDF,
            Self::Docx => MIME_DOCX,
            Self::Pptx => MIME_PPTX,
            Self::Xlsx => MIME_XLSX,
            Self::Csv => MIME_CSV,
            Self::Image(format) => format.mime(),
        }
    }

    /// Short label used in upload replies ("from the PDF").
    pub fn label(&self) -> &'static str {
        match self {
            Self::PlainText => "text file",
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Pptx => "PPTX",
            Self::Xlsx => "XLSX",
            Self::Csv => "CSV",
            Self::Image(_) => "image",
        }
    }

    pub fn is_tabular(&self) -> bool {
        matches!(self, Self::Xlsx | Self::Csv)
    }

    pub fn documents() -> Vec<MediaType> {
        vec![
            Self::PlainText,
            Self::Pdf,
            Self::Pptx,
            Self::Docx,
            Self::Xlsx,
            Self::Csv,
        ]
    }

    pub fn images() -> Vec<MediaType> {
        vec![
            Self::Image(ImageFormat::Jpeg),
            Self::Image(ImageFormat::Gif),
            Self::Image(ImageFormat::Png),
            Self::Image(ImageFormat::Webp),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// A hint attached to a free-text message by the front-end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentHint {
    LatestNews,
}

/// Anything the chat front-end can deliver to the dispatcher.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Message {
        text: String,
        intent: Option<IntentHint>,
    },
    Action {
        capability: Capability,
        value: ActionPayload,
    },
    Upload(UploadedFile),
}

impl InboundEvent {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message {
            text: text.into(),
            intent: None,
        }
    }

    pub fn action(capability: Capability, value: ActionPayload) -> Self {
        Self::Action { capability, value }
    }

    /// Rebuild an event from a clicked button's `{name, value}` pair.
    /// Names that match no capability are treated as a general message.
    pub fn from_wire(name: &str, value: ActionPayload) -> Self {
        match Capability::from_action_name(name) {
            Some(capability) => Self::Action { capability, value },
            None => {
                tracing::debug!(action = %name, "Unknown action name, routing to general chat");
                let text = match value {
                    ActionPayload::Text(text) => text,
                    _ => name.to_string(),
                };
                Self::message(text)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Text { name: String, content: String },
    Image {
        name: String,
        mime: String,
        #[serde(skip)]
        bytes: Vec<u8>,
    },
    ImageUrl { name: String, url: String },
    Html { content: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyKind {
    Normal,
    RequestUpload { accept: Vec<MediaType> },
    Unsupported,
    CapacityExceeded,
    ApiFailure,
}

/// One rendered assistant message.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub content: String,
    pub elements: Vec<Element>,
    pub actions: Vec<ActionDescriptor>,
    pub kind: ReplyKind,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            elements: Vec::new(),
            actions: Vec::new(),
            kind: ReplyKind::Normal,
        }
    }

    pub fn with_kind(mut self, kind: ReplyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionDescriptor>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn request_upload(content: impl Into<String>, accept: Vec<MediaType>) -> Self {
        Self::text(content).with_kind(ReplyKind::RequestUpload { accept })
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_mapping_covers_upload_set() {
        assert_eq!(MediaType::from_mime("text/plain; charset=utf-8"), Some(MediaType::PlainText));
        assert_eq!(MediaType::from_mime(MIME_DOCX), Some(MediaType::Docx));
        assert_eq!(
            MediaType::from_mime("image/webp"),
            Some(MediaType::Image(ImageFormat::Webp))
        );
        assert_eq!(MediaType::from_mime("application/zip"), None);
    }

    #[test]
    fn test_detect_falls_back_to_extension_for_generic_mime() {
        assert_eq!(
            MediaType::detect("application/octet-stream", "report.PDF"),
            Some(MediaType::Pdf)
        );
        assert_eq!(MediaType::detect("", "data.csv"), Some(MediaType::Csv));
        // A specific but unsupported MIME type is not second-guessed
        assert_eq!(MediaType::detect("application/zip", "data.csv"), None);
    }

    #[test]
    fn test_unknown_wire_name_becomes_message() {
        let event = InboundEvent::from_wire("Dance", ActionPayload::Text("hello".into()));
        assert!(matches!(event, InboundEvent::Message { ref text, .. } if text == "hello"));

        let event = InboundEvent::from_wire("Copy", ActionPayload::Text("x".into()));
        assert!(matches!(
            event,
            InboundEvent::Action {
                capability: Capability::Copy,
                ..
            }
        ));
    }
}

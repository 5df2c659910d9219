//! Fetches the readable content behind a URL the user pasted.

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ApiError;
use crate::processing::{extractor::extract_pdf_text, html::html_title, strip_html_tags};
use crate::tools::ApiClient;

const SERVICE: &str = "web";

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']+"#).expect("valid URL pattern")
});

/// First URL-looking substring of a message (`http(s)://…` or `www.…`),
/// without trailing punctuation.
pub fn find_url(text: &str) -> Option<String> {
    URL_PATTERN.find(text).map(|m| {
        m.as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']'])
            .to_string()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Webpage,
    Pdf,
}

impl PageKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Webpage => "webpage",
            Self::Pdf => "PDF",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub kind: PageKind,
    pub title: Option<String>,
    pub text: String,
}

pub struct WebFetcher {
    client: ApiClient,
}

impl WebFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Ok(Self::new(ApiClient::new(timeout_secs)?))
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, ApiError> {
        let url = normalize_url(url);
        tracing::info!(url = %url, "Fetching page content");

        if url.to_lowercase().contains(".pdf") {
            return self.fetch_pdf(&url).await;
        }

        let request = self.client.http().get(&url);
        let html = self.client.get_text(SERVICE, request).await?;
        let text = strip_html_tags(&html);
        if text.is_empty() {
            return Err(ApiError::Empty { service: SERVICE });
        }

        Ok(FetchedPage {
            title: html_title(&html),
            kind: PageKind::Webpage,
            text,
        })
    }

    async fn fetch_pdf(&self, url: &str) -> Result<FetchedPage, ApiError> {
        let request = self.client.http().get(url);
        let bytes = self.client.get_bytes(SERVICE, request).await?;

        let text = extract_pdf_text(&bytes).map_err(|e| ApiError::Malformed {
            service: SERVICE,
            message: e.to_string(),
        })?;

        Ok(FetchedPage {
            kind: PageKind::Pdf,
            title: None,
            text,
        })
    }
}

fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.to_lowercase().starts_with("http://") || url.to_lowercase().starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

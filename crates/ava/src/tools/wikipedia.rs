use async_trait::async_trait;
use serde::Deserialize;

use super::{ApiClient, Tool, ToolOutput};
use crate::config::ServiceConfig;
use crate::error::ApiError;

const SERVICE: &str = "wikipedia";

#[derive(Debug, Deserialize)]
struct PageSummary {
    title: Option<String>,
    extract: Option<String>,
    content_urls: ContentUrls,
    originalimage: Option<PageImage>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: PageUrls,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: String,
}

#[derive(Debug, Deserialize)]
struct PageImage {
    source: String,
}

#[derive(Debug, Deserialize)]
struct MediaList {
    #[serde(default)]
    items: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct MediaItem {
    #[serde(default)]
    srcset: Vec<MediaSource>,
}

#[derive(Debug, Deserialize)]
struct MediaSource {
    src: String,
}

/// Summary of a Wikipedia article with its lead image.
pub struct WikipediaTool {
    client: ApiClient,
    config: ServiceConfig,
}

impl WikipediaTool {
    pub fn new(client: ApiClient, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    /// First media-list image, used when the summary carries no lead image.
    /// A failure here only loses the picture.
    async fn media_list_image(&self, title: &str) -> Option<String> {
        let request = self
            .client
            .http()
            .get(format!("{}/page/media-list/{}", self.config.base_url, title));
        match self.client.get_json::<MediaList>(SERVICE, request).await {
            Ok(list) => list
                .items
                .into_iter()
                .find_map(|item| item.srcset.into_iter().next())
                .map(|src| absolute_url(&src.src)),
            Err(e) => {
                tracing::debug!(error = %e, "No media-list image");
                None
            }
        }
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    fn description(&self) -> &'static str {
        "Use this when you want to search wikipedia about things you have no knowledge of. The input to this should be a single search term."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        let title = super::encode(&query.trim().replace(' ', "_"));
        tracing::info!(query = %query, "Fetching Wikipedia summary");

        let request = self
            .client
            .http()
            .get(format!("{}/page/summary/{}", self.config.base_url, title))
            .query(&[("redirect", "false")]);
        let summary: PageSummary = self.client.get_json(SERVICE, request).await?;

        let image = match summary.originalimage.as_ref() {
            Some(image) => Some(image.source.clone()),
            None => self.media_list_image(&title).await,
        };

        Ok(format_summary(summary, image))
    }
}

fn format_summary(summary: PageSummary, image: Option<String>) -> ToolOutput {
    let title = summary
        .title
        .unwrap_or_else(|| "No title available".to_string());
    let extract = summary
        .extract
        .unwrap_or_else(|| "No summary available".to_string());
    let url = summary.content_urls.desktop.page;

    let mut markdown = String::new();
    if let Some(ref image) = image {
        markdown.push_str(&format!("![{}]({})\n\n", title, image));
    }
    markdown.push_str(&format!(
        "## {}\n{}\n**Source:** [{} Wikipedia page]({})",
        title, extract, title, url
    ));

    ToolOutput {
        markdown,
        clipboard: Some(format!("{}\n{}\n\nSource: {}", title, extract, url)),
        images: image.into_iter().collect(),
        html: None,
    }
}

fn absolute_url(src: &str) -> String {
    if src.starts_with("//") {
        format!("https:{}", src)
    } else {
        src.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_with_image() {
        let summary: PageSummary = serde_json::from_str(
            r#"{"title":"Rust (programming language)","extract":"Rust is a language.",
                "content_urls":{"desktop":{"page":"https://en.wikipedia.org/wiki/Rust"}},
                "originalimage":{"source":"https://upload.example/rust.png","width":1,"height":1}}"#,
        )
        .unwrap();
        let image = summary.originalimage.as_ref().map(|i| i.source.clone());
        let out = format_summary(summary, image);

        assert!(out
            .markdown
            .starts_with("![Rust (programming language)](https://upload.example/rust.png)\n\n## Rust"));
        assert!(out.markdown.ends_with(
            "**Source:** [Rust (programming language) Wikipedia page](https://en.wikipedia.org/wiki/Rust)"
        ));
        assert_eq!(
            out.clipboard.as_deref(),
            Some("Rust (programming language)\nRust is a language.\n\nSource: https://en.wikipedia.org/wiki/Rust")
        );
        assert_eq!(out.images, vec!["https://upload.example/rust.png"]);
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let summary: PageSummary = serde_json::from_str(
            r#"{"content_urls":{"desktop":{"page":"https://en.wikipedia.org/wiki/X"}}}"#,
        )
        .unwrap();
        let out = format_summary(summary, None);
        assert!(out.markdown.starts_with("## No title available\nNo summary available"));
        assert!(out.images.is_empty());
    }

    #[test]
    fn test_protocol_relative_media_links() {
        assert_eq!(absolute_url("//upload.wikimedia.org/a.jpg"), "https://upload.wikimedia.org/a.jpg");
        assert_eq!(absolute_url("https://x/a.jpg"), "https://x/a.jpg");
    }
}

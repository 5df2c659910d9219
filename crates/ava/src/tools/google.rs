//! Google Custom Search: web results and image results.

use async_trait::async_trait;
use serde::Deserialize;

use super::{encode, ApiClient, Tool, ToolOutput};
use crate::config::GoogleSearchConfig;
use crate::error::ApiError;

const WEB_SERVICE: &str = "web_search";
const IMAGE_SERVICE: &str = "image_search";
const MAX_WEB_RESULTS: usize = 5;
const MAX_IMAGES: usize = 6;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
    pagemap: Option<PageMap>,
}

#[derive(Debug, Deserialize)]
struct PageMap {
    #[serde(default)]
    cse_image: Vec<CseImage>,
}

#[derive(Debug, Deserialize)]
struct CseImage {
    src: String,
}

impl SearchItem {
    fn image(&self) -> Option<&str> {
        self.pagemap
            .as_ref()
            .and_then(|p| p.cse_image.first())
            .map(|img| img.src.as_str())
    }

    /// Snippets full of encoded spaces are usually scraped URLs, not prose.
    fn is_readable(&self) -> bool {
        self.snippet.matches("%20").count() <= 2
    }
}

async fn search(
    client: &ApiClient,
    config: &GoogleSearchConfig,
    service: &'static str,
    params: &[(&str, &str)],
) -> Result<SearchResponse, ApiError> {
    let key = config.key.require(service)?;
    let engine = config.engine_id.require(service)?;
    let request = client
        .http()
        .get(format!("{}/customsearch/v1", config.base_url))
        .query(&[("key", key.as_str()), ("cx", engine.as_str())])
        .query(params);
    client.get_json(service, request).await
}

/// Recent web results for a query.
pub struct WebSearchTool {
    client: ApiClient,
    config: GoogleSearchConfig,
}

impl WebSearchTool {
    pub fn new(client: ApiClient, config: GoogleSearchConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Use this when you want to search the internet to answer questions about things you have no knowledge of. The input to this should be a single search term."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        tracing::info!(query = %query, "Web search");
        let response = search(
            &self.client,
            &self.config,
            WEB_SERVICE,
            &[("q", query), ("dateRestrict", "m1"), ("safe", "active")],
        )
        .await?;
        format_web_results(query, response)
    }
}

fn format_web_results(query: &str, response: SearchResponse) -> Result<ToolOutput, ApiError> {
    let items: Vec<&SearchItem> = response
        .items
        .iter()
        .filter(|item| item.is_readable())
        .take(MAX_WEB_RESULTS)
        .collect();
    if items.is_empty() {
        return Err(ApiError::Empty {
            service: WEB_SERVICE,
        });
    }

    let mut markdown = format!("## {} Search Results\n", query);
    let mut clipboard = Vec::with_capacity(items.len());
    for item in &items {
        markdown.push_str(&format!("### [{}]({})\n", item.title, item.link));
        if let Some(src) = item.image() {
            markdown.push_str(&format!("![{}]({})\n", item.title, src));
        }
        markdown.push_str(&format!("{}\n\n", item.snippet));
        clipboard.push(format!(
            "{}\n{}\nSource: {}\n",
            item.title, item.snippet, item.link
        ));
    }
    markdown.push_str(&format!(
        "___\nSee more results [here](https://www.google.com/search?q={}&dateRestrict=m1&safe=active)",
        encode(query)
    ));

    Ok(ToolOutput::markdown(markdown).with_clipboard(clipboard.join("\n")))
}

/// Image links for a query.
pub struct ImageSearchTool {
    client: ApiClient,
    config: GoogleSearchConfig,
}

impl ImageSearchTool {
    pub fn new(client: ApiClient, config: GoogleSearchConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Tool for ImageSearchTool {
    fn name(&self) -> &'static str {
        "image_search"
    }

    fn description(&self) -> &'static str {
        "Use this when you want to search for images. The input to this should be a single search term."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        tracing::info!(query = %query, "Image search");
        let response = search(
            &self.client,
            &self.config,
            IMAGE_SERVICE,
            &[("q", query), ("searchType", "image")],
        )
        .await?;
        format_images(response)
    }
}

fn format_images(response: SearchResponse) -> Result<ToolOutput, ApiError> {
    let links: Vec<String> = response
        .items
        .into_iter()
        .take(MAX_IMAGES)
        .map(|item| item.link)
        .collect();
    if links.is_empty() {
        return Err(ApiError::Empty {
            service: IMAGE_SERVICE,
        });
    }

    Ok(ToolOutput {
        markdown: "## Here are your images:".to_string(),
        clipboard: Some(links.join("\n")),
        images: links,
        html: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, snippet: &str, image: Option<&str>) -> String {
        let pagemap = image
            .map(|src| format!(r#","pagemap":{{"cse_image":[{{"src":"{}"}}]}}"#, src))
            .unwrap_or_default();
        format!(
            r#"{{"title":"{t}","link":"https://{t}.example","snippet":"{s}"{p}}}"#,
            t = title,
            s = snippet,
            p = pagemap
        )
    }

    fn response(items: &[String]) -> SearchResponse {
        serde_json::from_str(&format!(r#"{{"items":[{}]}}"#, items.join(","))).unwrap()
    }

    #[test]
    fn test_web_results_skip_url_like_snippets_and_cap_at_five() {
        let mut items = vec![item("junk", "a%20b%20c%20d", None)];
        items.extend((0..7).map(|i| item(&format!("r{}", i), "fine text", None)));
        items[3] = item("r2", "has image", Some("https://img.example/x.png"));

        let out = format_web_results("rust lang", response(&items)).unwrap();
        assert!(!out.markdown.contains("junk"));
        assert_eq!(out.markdown.matches("### [").count(), 5);
        assert!(out.markdown.contains("![r2](https://img.example/x.png)"));
        assert!(out.markdown.ends_with(
            "See more results [here](https://www.google.com/search?q=rust%20lang&dateRestrict=m1&safe=active)"
        ));
        let clipboard = out.clipboard.unwrap();
        assert!(clipboard.starts_with("r0\nfine text\nSource: https://r0.example\n"));
    }

    #[test]
    fn test_web_results_empty() {
        let out = format_web_results("q", response(&[]));
        assert!(matches!(out, Err(ApiError::Empty { service: "web_search" })));
    }

    #[test]
    fn test_images_take_six_links() {
        let items: Vec<String> = (0..9).map(|i| item(&format!("i{}", i), "", None)).collect();
        let out = format_images(response(&items)).unwrap();
        assert_eq!(out.images.len(), 6);
        assert_eq!(out.images[0], "https://i0.example");
        assert_eq!(out.clipboard.unwrap().lines().count(), 6);
        assert_eq!(out.markdown, "## Here are your images:");
    }

    #[test]
    fn test_missing_items_field_is_empty_not_malformed() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"kind":"customsearch#search"}"#).unwrap();
        assert!(matches!(format_images(parsed), Err(ApiError::Empty { .. })));
    }
}

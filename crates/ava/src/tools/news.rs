use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use super::{ApiClient, Tool, ToolOutput};
use crate::config::ServiceConfig;
use crate::error::ApiError;

const SERVICE: &str = "news";
const MAX_ARTICLES: usize = 10;
const LOOKBACK_DAYS: i64 = 5;

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    url: String,
    #[serde(default)]
    source: ArticleSource,
}

#[derive(Debug, Default, Deserialize)]
struct ArticleSource {
    #[serde(alias = "Name")]
    name: Option<String>,
}

/// Most popular English-language articles about a topic from the last few days.
pub struct NewsTool {
    client: ApiClient,
    config: ServiceConfig,
}

impl NewsTool {
    pub fn new(client: ApiClient, config: ServiceConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Tool for NewsTool {
    fn name(&self) -> &'static str {
        "news"
    }

    fn description(&self) -> &'static str {
        "Use this when you want to get information about the top headlines of current news stories. The input should be the news topic."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        let api_key = self.config.key.require(SERVICE)?;
        let today = Utc::now().date_naive();
        let from = (today - Duration::days(LOOKBACK_DAYS))
            .format("%Y-%m-%d")
            .to_string();
        let to = today.format("%Y-%m-%d").to_string();

        tracing::info!(query = %query, "Searching news");
        let request = self
            .client
            .http()
            .get(format!("{}/v2/everything", self.config.base_url))
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("language", "en"),
                ("sortBy", "popularity"),
                ("apiKey", api_key.as_str()),
            ]);

        let response: NewsResponse = self.client.get_json(SERVICE, request).await?;
        format_news(query, response)
    }
}

fn format_news(query: &str, response: NewsResponse) -> Result<ToolOutput, ApiError> {
    let articles: Vec<Article> = response.articles.into_iter().take(MAX_ARTICLES).collect();
    if articles.is_empty() {
        return Err(ApiError::Empty { service: SERVICE });
    }

    let mut markdown = format!("## {} News\n\n", query);
    let mut clipboard = String::new();
    for article in &articles {
        let source = article.source.name.as_deref().unwrap_or("Unknown");
        markdown.push_str(&format!(
            "1. {} [({})]({})\n",
            article.title, source, article.url
        ));
        clipboard.push_str(&format!("- {} ({})\n", article.title, article.url));
    }

    Ok(ToolOutput::markdown(markdown.trim_end()).with_clipboard(clipboard))
}

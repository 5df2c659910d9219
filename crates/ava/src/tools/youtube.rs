use async_trait::async_trait;
use serde::Deserialize;

use super::{ApiClient, Tool, ToolOutput};
use crate::config::ServiceConfig;
use crate::error::ApiError;

const SERVICE: &str = "youtube";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

pub struct YouTubeTool {
    client: ApiClient,
    config: ServiceConfig,
}

impl YouTubeTool {
    pub fn new(client: ApiClient, config: ServiceConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Tool for YouTubeTool {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn description(&self) -> &'static str {
        "Use this when you want to search for videos. The input to this should be a single search term."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        let key = self.config.key.require(SERVICE)?;
        tracing::info!(query = %query, "Searching YouTube");

        let request = self
            .client
            .http()
            .get(format!("{}/youtube/v3/search", self.config.base_url))
            .query(&[
                ("maxResults", "5"),
                ("q", query),
                ("key", key.as_str()),
                ("type", "video"),
                ("part", "snippet"),
            ]);
        let response: SearchResponse = self.client.get_json(SERVICE, request).await?;

        let video_id = response
            .items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .ok_or(ApiError::Empty { service: SERVICE })?;
        Ok(format_video(query, &video_id))
    }
}

fn format_video(query: &str, video_id: &str) -> ToolOutput {
    let watch_url = format!("https://www.youtube.com/watch?v={}", video_id);
    let html = format!(
        r#"<div class="card text-bg-light text-center">
    <div class="card-header text-uppercase pt-3 pb-2 px-3">
        <a href="{watch}" target="_blank" style="text-decoration: none"><h2 class="text-primary text-uppercase">{query}</h2></a>
    </div>
    <div class="card-body pt-2 pb-1 px-2" style="max-width: 100%">
        <iframe width="100%" height="280" src="https://www.youtube-nocookie.com/embed/{id}" title="{query}" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; web-share" allowfullscreen></iframe>
    </div>
    <div class="card-footer pt-2 pb-2 px-2">
        <a href="{watch}" target="_blank"><button class="btn btn-secondary btn-lg text-center" style="width: 80%">SEE MORE...</button></a>
    </div>
</div>"#,
        watch = watch_url,
        query = query,
        id = video_id
    );

    ToolOutput {
        markdown: format!("## {}\n[Watch on YouTube]({})", query, watch_url),
        clipboard: Some(watch_url),
        images: Vec::new(),
        html: Some(html),
    }
}

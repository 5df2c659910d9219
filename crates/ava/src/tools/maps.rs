use async_trait::async_trait;

use super::{encode, Tool, ToolOutput};
use crate::config::ServiceConfig;
use crate::error::ApiError;

/// Embedded Google Map of a place. Builds the embed URL locally; the browser
/// does the fetching.
pub struct MapsTool {
    config: ServiceConfig,
}

impl MapsTool {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Tool for MapsTool {
    fn name(&self) -> &'static str {
        "maps"
    }

    fn description(&self) -> &'static str {
        "Use this when you want to search for a location or get a map. The input to this should be a single search term."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        let key = self.config.key.require("maps")?;
        Ok(format_map(&self.config.base_url, &key, query))
    }
}

fn format_map(base_url: &str, key: &str, query: &str) -> ToolOutput {
    let encoded = encode(query);
    let search_url = format!("https://www.google.com/maps/search/{}", encoded);
    let embed_url = format!("{}/embed/v1/place?key={}&q={}", base_url, key, encoded);

    let html = format!(
        r#"<div class="card text-bg-light text-center">
    <div class="card-header text-uppercase pt-3 pb-2 px-3">
        <a href="{search}" target="_blank" style="text-decoration: none"><h2 class="text-primary text-uppercase">{query}</h2></a>
    </div>
    <div class="card-body pt-2 pb-1 px-2" style="width: 100%">
        <iframe width="100%" height="315" frameborder="0" style="border:0" referrerpolicy="no-referrer-when-downgrade" src="{embed}" allowfullscreen></iframe>
    </div>
    <div class="card-footer pt-2 pb-2 px-2">
        <a href="{search}" target="_blank"><button class="btn btn-secondary btn-lg text-center" style="width: 80%">SEE MORE...</button></a>
    </div>
</div>"#,
        search = search_url,
        query = query,
        embed = embed_url
    );

    ToolOutput {
        markdown: format!("## {}\n[Open in Google Maps]({})", query, search_url),
        clipboard: Some(search_url),
        images: Vec::new(),
        html: Some(html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credential;

    #[test]
    fn test_map_card_encodes_query() {
        let out = format_map("https://www.google.com/maps", "k", "Eiffel Tower");
        let html = out.html.unwrap();
        assert!(html.contains("https://www.google.com/maps/embed/v1/place?key=k&q=Eiffel%20Tower"));
        assert_eq!(
            out.clipboard.as_deref(),
            Some("https://www.google.com/maps/search/Eiffel%20Tower")
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_reported() {
        let tool = MapsTool::new(ServiceConfig {
            base_url: "https://www.google.com/maps".into(),
            key: Credential::from_env("AVA_TEST_NO_MAPS_KEY"),
        });
        assert!(matches!(
            tool.run("Paris").await,
            Err(ApiError::MissingCredential { service: "maps", .. })
        ));
    }
}

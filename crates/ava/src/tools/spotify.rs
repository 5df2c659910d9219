use async_trait::async_trait;
use serde::Deserialize;

use super::{ApiClient, Tool, ToolOutput};
use crate::config::SpotifyConfig;
use crate::error::ApiError;

const SERVICE: &str = "music";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    playlists: PlaylistPage,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    // Spotify pads pages with nulls for removed playlists
    #[serde(default)]
    items: Vec<Option<Playlist>>,
}

#[derive(Debug, Deserialize)]
struct Playlist {
    name: Option<String>,
    owner: Owner,
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct Owner {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: String,
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    html: String,
}

/// Spotify-curated playlist for a mood, genre or artist, as an embed.
pub struct MusicTool {
    client: ApiClient,
    config: SpotifyConfig,
}

impl MusicTool {
    pub fn new(client: ApiClient, config: SpotifyConfig) -> Self {
        Self { client, config }
    }

    async fn access_token(&self) -> Result<String, ApiError> {
        let client_id = self.config.client_id.require(SERVICE)?;
        let client_secret = self.config.client_secret.require(SERVICE)?;
        let request = self.client.http().post(&self.config.token_url).form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ]);
        let token: TokenResponse = self.client.get_json(SERVICE, request).await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl Tool for MusicTool {
    fn name(&self) -> &'static str {
        "music"
    }

    fn description(&self) -> &'static str {
        "Use this when you want to search for music. The input to this should be a single search term."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        let token = self.access_token().await?;
        tracing::info!(query = %query, "Searching Spotify playlists");

        let request = self
            .client
            .http()
            .get(format!("{}/v1/search", self.config.api_url))
            .bearer_auth(&token)
            .query(&[("q", query), ("type", "playlist")]);
        let response: SearchResponse = self.client.get_json(SERVICE, request).await?;
        let playlist = pick_playlist(response).ok_or(ApiError::Empty { service: SERVICE })?;

        let request = self
            .client
            .http()
            .get(&self.config.embed_url)
            .query(&[("url", playlist.external_urls.spotify.as_str())]);
        let embed: OEmbed = self.client.get_json(SERVICE, request).await?;

        Ok(format_playlist(&playlist, &embed.html))
    }
}

/// First playlist curated by Spotify itself.
fn pick_playlist(response: SearchResponse) -> Option<Playlist> {
    response
        .playlists
        .items
        .into_iter()
        .flatten()
        .find(|p| p.owner.display_name.as_deref() == Some("Spotify"))
}

fn format_playlist(playlist: &Playlist, embed_html: &str) -> ToolOutput {
    let url = &playlist.external_urls.spotify;
    let name = playlist.name.as_deref().unwrap_or("Spotify playlist");
    ToolOutput {
        markdown: format!("## {}\n[Listen on Spotify]({})", name, url),
        clipboard: Some(format!("{}\n{}", name, url)),
        images: Vec::new(),
        html: Some(format!(
            r#"<div class="spotifyMusicAnswer">{}</div>"#,
            embed_html.replace('\\', "")
        )),
    }
}

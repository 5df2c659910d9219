//! The Movie Database multi-search: people, films and TV shows.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use super::{ApiClient, Tool, ToolOutput};
use crate::config::ServiceConfig;
use crate::error::ApiError;

const SERVICE: &str = "movies";
const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w600_and_h900_bestv2";
const SITE: &str = "https://www.themoviedb.org";

#[derive(Debug, Deserialize)]
struct MultiSearch {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
enum SearchHit {
    Person {
        id: u64,
        name: String,
        profile_path: Option<String>,
        #[serde(default)]
        known_for: Vec<KnownFor>,
    },
    Movie {
        id: u64,
        title: String,
        #[serde(default)]
        overview: String,
        poster_path: Option<String>,
        release_date: Option<String>,
        #[serde(default)]
        vote_average: f64,
    },
    Tv {
        id: u64,
        name: String,
        #[serde(default)]
        overview: String,
        poster_path: Option<String>,
        first_air_date: Option<String>,
        #[serde(default)]
        vote_average: f64,
    },
}

#[derive(Debug, Deserialize)]
struct KnownFor {
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
}

pub struct MoviesTool {
    client: ApiClient,
    config: ServiceConfig,
}

impl MoviesTool {
    pub fn new(client: ApiClient, config: ServiceConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Tool for MoviesTool {
    fn name(&self) -> &'static str {
        "movies"
    }

    fn description(&self) -> &'static str {
        "Use this when you want to search for movies, tv shows or actors. The input to this should be a single search term."
    }

    async fn run(&self, query: &str) -> Result<ToolOutput, ApiError> {
        let key = self.config.key.require(SERVICE)?;
        tracing::info!(query = %query, "Searching TMDB");

        let request = self
            .client
            .http()
            .get(format!("{}/3/search/multi", self.config.base_url))
            .query(&[("query", query), ("api_key", key.as_str())]);
        let response: MultiSearch = self.client.get_json(SERVICE, request).await?;
        format_first_hit(response)
    }
}

fn format_first_hit(response: MultiSearch) -> Result<ToolOutput, ApiError> {
    let first = response
        .results
        .into_iter()
        .next()
        .ok_or(ApiError::Empty { service: SERVICE })?;
    let hit: SearchHit = serde_json::from_value(first).map_err(|e| ApiError::Malformed {
        service: SERVICE,
        message: e.to_string(),
    })?;

    let output = match hit {
        SearchHit::Person {
            id,
            name,
            profile_path,
            known_for,
        } => {
            let page = format!("{}/person/{}-{}", SITE, id, slug(&name));
            let known_for = known_for
                .iter()
                .filter_map(|item| {
                    let title = item
                        .title
                        .as_deref()
                        .or(item.name.as_deref())
                        .unwrap_or("Unknown");
                    item.poster_path
                        .as_deref()
                        .map(|poster| format!("![{}]({}{})", title, POSTER_BASE, poster))
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            let markdown = format!(
                "## {name}\n{image}___\n### Known for:\n{known_for}\n\nSee more info [here]({page})",
                name = name,
                image = poster_line(&name, profile_path.as_deref()),
                known_for = known_for,
                page = page
            );
            ToolOutput::markdown(markdown).with_clipboard(format!("{}\nSource: {}", name, page))
        }
        SearchHit::Movie {
            id,
            title,
            overview,
            poster_path,
            release_date,
            vote_average,
        } => title_card(
            &format!("{}/movie/{}-{}", SITE, id, slug(&title)),
            &title,
            &overview,
            poster_path.as_deref(),
            release_date.as_deref(),
            vote_average,
        ),
        SearchHit::Tv {
            id,
            name,
            overview,
            poster_path,
            first_air_date,
            vote_average,
        } => title_card(
            &format!("{}/tv/{}-{}", SITE, id, slug(&name)),
            &name,
            &overview,
            poster_path.as_deref(),
            first_air_date.as_deref(),
            vote_average,
        ),
    };

    Ok(output)
}

fn title_card(
    page: &str,
    name: &str,
    overview: &str,
    poster: Option<&str>,
    date: Option<&str>,
    rating: f64,
) -> ToolOutput {
    let date = date.and_then(format_release_date).unwrap_or_else(|| "Unknown".into());
    let rating = format!("{:.1}", rating);
    let markdown = format!(
        "## {name}\n{image}**RELEASE DATE**: {date}\n**TMDB RATING**: {rating}\n**Overview:** {overview}\n\nSee more info [here]({page})",
        name = name,
        image = poster_line(name, poster),
        date = date,
        rating = rating,
        overview = overview,
        page = page
    );
    let clipboard = format!(
        "{}\n{}\nRelease Date: {}\nTMDB Rating: {}\nSource: {}",
        name, overview, date, rating, page
    );
    ToolOutput::markdown(markdown).with_clipboard(clipboard)
}

fn poster_line(name: &str, path: Option<&str>) -> String {
    path.map(|p| format!("![{}]({}{})\n", name, POSTER_BASE, p))
        .unwrap_or_default()
}

fn slug(name: &str) -> String {
    name.replace(' ', "-")
}

/// "2010-07-16" -> "16th July 2010"
fn format_release_date(raw: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (1, d) if d != 11 => "st",
        (2, d) if d != 12 => "nd",
        (3, d) if d != 13 => "rd",
        _ => "th",
    };
    Some(format!("{}{} {}", day, suffix, date.format("%B %Y")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(body: &str) -> MultiSearch {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_release_date_ordinals() {
        assert_eq!(format_release_date("2010-07-16").as_deref(), Some("16th July 2010"));
        assert_eq!(format_release_date("1999-03-01").as_deref(), Some("1st March 1999"));
        assert_eq!(format_release_date("2001-11-22").as_deref(), Some("22nd November 2001"));
        assert_eq!(format_release_date("2001-11-11").as_deref(), Some("11th November 2001"));
        assert_eq!(format_release_date("2001-11-23").as_deref(), Some("23rd November 2001"));
        assert_eq!(format_release_date(""), None);
    }

    #[test]
    fn test_movie_card() {
        let out = format_first_hit(search(
            r#"{"results":[{"media_type":"movie","id":27205,"title":"Inception","overview":"Dreams.","poster_path":"/p.jpg","release_date":"2010-07-16","vote_average":8.364}]}"#,
        ))
        .unwrap();
        assert!(out.markdown.contains("**RELEASE DATE**: 16th July 2010"));
        assert!(out.markdown.contains("**TMDB RATING**: 8.4"));
        assert!(out.markdown.contains(&format!("![Inception]({}/p.jpg)", POSTER_BASE)));
        assert!(out
            .clipboard
            .unwrap()
            .ends_with("Source: https://www.themoviedb.org/movie/27205-Inception"));
    }

    #[test]
    fn test_tv_links_to_tv_page() {
        let out = format_first_hit(search(
            r#"{"results":[{"media_type":"tv","id":1396,"name":"Breaking Bad","overview":"Chemistry.","first_air_date":"2008-01-20","vote_average":8.9}]}"#,
        ))
        .unwrap();
        assert!(out.markdown.contains("https://www.themoviedb.org/tv/1396-Breaking-Bad"));
        assert!(out.clipboard.unwrap().contains("/tv/1396-Breaking-Bad"));
    }

    #[test]
    fn test_person_known_for() {
        let out = format_first_hit(search(
            r#"{"results":[{"media_type":"person","id":6193,"name":"Leonardo DiCaprio","profile_path":"/l.jpg",
                "known_for":[{"title":"Inception","poster_path":"/i.jpg"},{"name":"Some Show","poster_path":"/s.jpg"},{"title":"No poster"}]}]}"#,
        ))
        .unwrap();
        assert!(out.markdown.contains("### Known for:"));
        assert!(out.markdown.contains("![Inception]"));
        assert!(out.markdown.contains("![Some Show]"));
        assert!(!out.markdown.contains("No poster"));
        assert_eq!(
            out.clipboard.as_deref(),
            Some("Leonardo DiCaprio\nSource: https://www.themoviedb.org/person/6193-Leonardo-DiCaprio")
        );
    }

    #[test]
    fn test_no_results_and_unknown_shapes() {
        assert!(matches!(
            format_first_hit(search(r#"{"results":[]}"#)),
            Err(ApiError::Empty { .. })
        ));
        assert!(matches!(
            format_first_hit(search(r#"{"results":[{"media_type":"collection","id":1}]}"#)),
            Err(ApiError::Malformed { .. })
        ));
    }
}

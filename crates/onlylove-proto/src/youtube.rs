//! YouTube Data API client

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::YouTubeConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("unexpected {endpoint} response: {detail}")]
    Parse {
        endpoint: &'static str,
        detail: String,
    },
}

/// One row of a playlistItems response, flattened to what the feed needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub video_id: String,
}

/// The two video platform queries the site relies on.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Items of `playlist_id`, in the order the platform returns them.
    async fn playlist_items(
        &self,
        playlist_id: &str,
        api_key: &str,
        max_results: u32,
    ) -> Result<Vec<PlaylistItem>, FetchError>;

    /// Ids of videos currently broadcasting live on `channel_id`.
    async fn live_videos(&self, channel_id: &str, api_key: &str)
        -> Result<Vec<String>, FetchError>;
}

// ── wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    items: Vec<PlaylistItemResource>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemResource {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    description: String,
    published_at: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    video_id: String,
}

pub fn parse_playlist_items(body: &str) -> Result<Vec<PlaylistItem>, FetchError> {
    let response: PlaylistItemsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse {
            endpoint: "playlistItems",
            detail: e.to_string(),
        })?;
    Ok(response
        .items
        .into_iter()
        .map(|item| PlaylistItem {
            title: item.snippet.title,
            description: item.snippet.description,
            published_at: item.snippet.published_at,
            video_id: item.snippet.resource_id.video_id,
        })
        .collect())
}

pub fn parse_live_search(body: &str) -> Result<Vec<String>, FetchError> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| FetchError::Parse {
        endpoint: "search",
        detail: e.to_string(),
    })?;
    Ok(response.items.into_iter().map(|r| r.id.video_id).collect())
}

// ── client ────────────────────────────────────────────────────────────────────

pub struct YouTubeClient {
    client: reqwest::Client,
    api_base: String,
}

impl YouTubeClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("onlylove/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(FetchError::Transport)?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &YouTubeConfig) -> Result<Self, FetchError> {
        Self::new(config.api_base.clone(), config.request_timeout())
    }

    async fn get(&self, endpoint: &'static str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.api_base, endpoint);
        // The query carries the API key, so only the endpoint is logged.
        debug!("[youtube] GET {}", endpoint);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { endpoint, status });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.without_url()))
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn playlist_items(
        &self,
        playlist_id: &str,
        api_key: &str,
        max_results: u32,
    ) -> Result<Vec<PlaylistItem>, FetchError> {
        let max_results = max_results.to_string();
        let body = self
            .get(
                "playlistItems",
                &[
                    ("part", "snippet"),
                    ("maxResults", max_results.as_str()),
                    ("playlistId", playlist_id),
                    ("key", api_key),
                ],
            )
            .await?;
        parse_playlist_items(&body)
    }

    async fn live_videos(
        &self,
        channel_id: &str,
        api_key: &str,
    ) -> Result<Vec<String>, FetchError> {
        let body = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("eventType", "live"),
                    ("type", "video"),
                    ("key", api_key),
                ],
            )
            .await?;
        parse_live_search(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlist_items() {
        let body = r#"{
            "kind": "youtube#playlistItemListResponse",
            "items": [
                {
                    "snippet": {
                        "publishedAt": "2024-03-10T20:00:00Z",
                        "title": "Episode 12",
                        "description": "Love songs",
                        "resourceId": { "kind": "youtube#video", "videoId": "vid12" }
                    }
                },
                {
                    "snippet": {
                        "publishedAt": "2024-03-03T20:00:00Z",
                        "title": "Episode 11",
                        "description": "",
                        "resourceId": { "kind": "youtube#video", "videoId": "vid11" }
                    }
                }
            ]
        }"#;
        let items = parse_playlist_items(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].video_id, "vid12");
        assert_eq!(items[0].description, "Love songs");
        assert_eq!(items[1].description, "");
        assert_eq!(items[1].published_at, "2024-03-03T20:00:00Z");
    }

    #[test]
    fn test_parse_playlist_items_rejects_missing_items() {
        let err = parse_playlist_items(r#"{"error": {"code": 403}}"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse { endpoint: "playlistItems", .. }));
    }

    #[test]
    fn test_parse_playlist_items_rejects_missing_video_id() {
        let body = r#"{"items": [{"snippet": {"title": "x", "publishedAt": "2024-01-01T00:00:00Z", "resourceId": {}}}]}"#;
        assert!(parse_playlist_items(body).is_err());
    }

    #[test]
    fn test_parse_playlist_items_rejects_missing_description() {
        let body = r#"{"items": [{"snippet": {"title": "x", "publishedAt": "2024-01-01T00:00:00Z", "resourceId": {"videoId": "v"}}}]}"#;
        assert!(matches!(
            parse_playlist_items(body),
            Err(FetchError::Parse { endpoint: "playlistItems", .. })
        ));
    }

    #[test]
    fn test_parse_live_search() {
        let body = r#"{"items": [{"id": {"kind": "youtube#video", "videoId": "abc123"}}]}"#;
        assert_eq!(parse_live_search(body).unwrap(), vec!["abc123".to_string()]);

        assert!(parse_live_search(r#"{"items": []}"#).unwrap().is_empty());
        assert!(parse_live_search(r#"{"kind": "youtube#searchListResponse"}"#)
            .unwrap()
            .is_empty());
    }
}

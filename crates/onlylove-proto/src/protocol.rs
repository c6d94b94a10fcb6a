use serde::{Deserialize, Serialize};

/// One entry of the episode list shown on the site.
///
/// The serialized form (camelCase keys) is also the cache format, so adding
/// fields here changes what `onlyLoveEpisodes` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    /// 1-based position in the displayed list.
    pub id: u32,
    pub title: String,
    /// Raw ISO-8601 publish time. Placeholders have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Long-form display date, e.g. "January 5, 2024".
    pub date: String,
    pub description: String,
    pub video_id: String,
}

impl Episode {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.video_id)
    }
}

/// Which path produced the current episode list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeSource {
    /// Nothing loaded yet.
    #[default]
    Pending,
    /// Served from a fresh cache entry.
    Cache,
    /// Fetched from the playlist API and cached.
    Remote,
    /// No API key configured; placeholder shown.
    Unconfigured,
    /// Fetch failed; placeholder shown.
    Fallback,
}

/// Whether the channel is broadcasting, and what to embed if so.
///
/// Fields are private and there is no `Deserialize`: `live_video_id` is
/// `Some` exactly when `is_live`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    is_live: bool,
    live_video_id: Option<String>,
}

impl LiveState {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn live(video_id: impl Into<String>) -> Self {
        Self {
            is_live: true,
            live_video_id: Some(video_id.into()),
        }
    }

    pub fn is_live(&self) -> bool {
        self.is_live
    }

    pub fn live_video_id(&self) -> Option<&str> {
        self.live_video_id.as_deref()
    }
}

/// Full in-memory state served to the site. `rev` is a monotonically
/// increasing counter bumped on every change.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteState {
    pub rev: u64,
    pub episodes: Vec<Episode>,
    pub episode_source: EpisodeSource,
    pub live: LiveState,
}

/// A contact form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

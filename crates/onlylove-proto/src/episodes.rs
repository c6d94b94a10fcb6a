//! Episode feed: the six most recent episodes of the show's playlist.
//!
//! ## Load sequence
//!
//!   1. No API key → configure-me placeholder, cache and network untouched.
//!   2. Fresh cache (younger than 24 h) → return it as-is, no network.
//!   3. One playlistItems request (max 50) → normalize, newest first, take 6,
//!      renumber 1..N → write cache → return.
//!   4. Any fetch/parse failure → latest-episode placeholder. No cache write,
//!      no retry.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::YouTubeConfig;
use crate::protocol::{Episode, EpisodeSource};
use crate::youtube::{FetchError, PlaylistItem, VideoPlatform};

pub const CACHE_KEY_EPISODES: &str = "onlyLoveEpisodes";
pub const CACHE_KEY_TIMESTAMP: &str = "onlyLoveEpisodesTimestamp";

pub const MAX_RESULTS: u32 = 50;
pub const MAX_EPISODES: usize = 6;
pub const DESCRIPTION_LIMIT: usize = 150;
pub const ELLIPSIS: &str = "...";

pub const PLACEHOLDER_VIDEO_ID: &str = "xvEnPzeH80I";
const PLACEHOLDER_TITLE: &str = "Only Love - Latest Episode";
const PLACEHOLDER_DATE: &str = "Recent";
const UNCONFIGURED_DESCRIPTION: &str = "Configure YouTube API key to automatically load episodes.";
const FALLBACK_DESCRIPTION: &str = "Watch the latest episode of Only Love Radio.";
const EMPTY_DESCRIPTION: &str = "Watch this episode of Only Love Radio";

pub fn freshness_window() -> Duration {
    Duration::hours(24)
}

/// The list to show plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResult {
    pub episodes: Vec<Episode>,
    pub source: EpisodeSource,
}

pub struct EpisodeFeed {
    platform: Arc<dyn VideoPlatform>,
    cache: Arc<dyn CacheStore>,
    playlist_id: String,
    api_key: Option<String>,
    // One load at a time, so a stale cache is refreshed once.
    load_lock: Mutex<()>,
}

impl EpisodeFeed {
    pub fn new(
        platform: Arc<dyn VideoPlatform>,
        cache: Arc<dyn CacheStore>,
        playlist_id: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            platform,
            cache,
            playlist_id: playlist_id.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            load_lock: Mutex::new(()),
        }
    }

    pub fn from_config(
        config: &YouTubeConfig,
        platform: Arc<dyn VideoPlatform>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self::new(
            platform,
            cache,
            config.playlist_id.clone(),
            config.api_key().map(str::to_string),
        )
    }

    pub fn playlist_url(&self) -> String {
        format!("https://www.youtube.com/playlist?list={}", self.playlist_id)
    }

    pub async fn load(&self) -> FeedResult {
        self.load_at(Utc::now()).await
    }

    /// Run the load sequence as of `now`. Never fails: every error path
    /// ends in a placeholder list.
    pub async fn load_at(&self, now: DateTime<Utc>) -> FeedResult {
        let _guard = self.load_lock.lock().await;

        let Some(api_key) = self.api_key.as_deref() else {
            info!("[episodes] No API key configured, showing placeholder");
            return FeedResult {
                episodes: vec![placeholder(UNCONFIGURED_DESCRIPTION)],
                source: EpisodeSource::Unconfigured,
            };
        };

        if let Some(episodes) = self.read_cache(now) {
            info!("[episodes] Loading {} episodes from cache", episodes.len());
            return FeedResult {
                episodes,
                source: EpisodeSource::Cache,
            };
        }

        info!("[episodes] Fetching fresh episodes for playlist {}", self.playlist_id);
        match self.fetch(api_key).await {
            Ok(episodes) => {
                self.write_cache(&episodes, now);
                info!("[episodes] Fetched {} episodes", episodes.len());
                FeedResult {
                    episodes,
                    source: EpisodeSource::Remote,
                }
            }
            Err(e) => {
                warn!("[episodes] Error fetching playlist: {}", e);
                FeedResult {
                    episodes: vec![placeholder(FALLBACK_DESCRIPTION)],
                    source: EpisodeSource::Fallback,
                }
            }
        }
    }

    async fn fetch(&self, api_key: &str) -> Result<Vec<Episode>, FetchError> {
        let items = self
            .platform
            .playlist_items(&self.playlist_id, api_key, MAX_RESULTS)
            .await?;
        debug!("[episodes] playlistItems returned {} items", items.len());
        latest_episodes(items)
    }

    fn read_cache(&self, now: DateTime<Utc>) -> Option<Vec<Episode>> {
        let cached = match self.cache.get(CACHE_KEY_EPISODES) {
            Ok(v) => v?,
            Err(e) => {
                warn!("[episodes] Cache read failed: {}", e);
                return None;
            }
        };
        let fetched_at = self
            .cache
            .get(CACHE_KEY_TIMESTAMP)
            .ok()
            .flatten()?
            .trim()
            .parse::<i64>()
            .ok()?;

        if !is_fresh(fetched_at, now) {
            debug!("[episodes] Cache expired (fetched at {})", fetched_at);
            return None;
        }

        match serde_json::from_str(&cached) {
            Ok(episodes) => Some(episodes),
            Err(e) => {
                warn!("[episodes] Ignoring unreadable cached episodes: {}", e);
                None
            }
        }
    }

    fn write_cache(&self, episodes: &[Episode], now: DateTime<Utc>) {
        let json = match serde_json::to_string(episodes) {
            Ok(j) => j,
            Err(e) => {
                warn!("[episodes] Could not serialize episodes for cache: {}", e);
                return;
            }
        };
        let result = self
            .cache
            .set(CACHE_KEY_EPISODES, &json)
            .and_then(|_| {
                self.cache
                    .set(CACHE_KEY_TIMESTAMP, &now.timestamp_millis().to_string())
            });
        if let Err(e) = result {
            warn!("[episodes] Cache write failed: {}", e);
        }
    }
}

/// A cache entry is reusable iff it is younger than the freshness window.
pub fn is_fresh(fetched_at_millis: i64, now: DateTime<Utc>) -> bool {
    now.timestamp_millis() - fetched_at_millis < freshness_window().num_milliseconds()
}

/// Normalize, sort newest first, keep `MAX_EPISODES`, renumber from 1.
pub fn latest_episodes(items: Vec<PlaylistItem>) -> Result<Vec<Episode>, FetchError> {
    let mut dated = items
        .into_iter()
        .map(|item| -> Result<_, FetchError> {
            let published = parse_published(&item.published_at)?;
            Ok((published, to_episode(item, &published)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    dated.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(dated
        .into_iter()
        .take(MAX_EPISODES)
        .zip(1..)
        .map(|((_, episode), id)| Episode { id, ..episode })
        .collect())
}

fn parse_published(raw: &str) -> Result<DateTime<FixedOffset>, FetchError> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| FetchError::Parse {
        endpoint: "playlistItems",
        detail: format!("bad publishedAt {:?}: {}", raw, e),
    })
}

fn to_episode(item: PlaylistItem, published: &DateTime<FixedOffset>) -> Episode {
    Episode {
        id: 0,
        date: long_date(published),
        description: summarize(&item.description),
        title: item.title,
        published_at: Some(item.published_at),
        video_id: item.video_id,
    }
}

/// "January 5, 2024", in the timestamp's own offset.
pub fn long_date(published: &DateTime<FixedOffset>) -> String {
    published.format("%B %-d, %Y").to_string()
}

/// Cap a description at `DESCRIPTION_LIMIT` characters plus an ellipsis.
/// Shorter descriptions are kept whole; an empty one gets a default line.
pub fn summarize(raw: &str) -> String {
    if raw.is_empty() {
        return EMPTY_DESCRIPTION.to_string();
    }
    match raw.char_indices().nth(DESCRIPTION_LIMIT) {
        Some((cut, _)) => format!("{}{}", &raw[..cut], ELLIPSIS),
        None => raw.to_string(),
    }
}

fn placeholder(description: &str) -> Episode {
    Episode {
        id: 1,
        title: PLACEHOLDER_TITLE.to_string(),
        published_at: None,
        date: PLACEHOLDER_DATE.to_string(),
        description: description.to_string(),
        video_id: PLACEHOLDER_VIDEO_ID.to_string(),
    }
}

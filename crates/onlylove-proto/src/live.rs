//! Live status poller.
//!
//! Polls the channel's live search once at start and then on a fixed
//! interval, publishing a `LiveState` into the `StateManager`. Every failure
//! reads as "offline" and is retried at the next tick.
//!
//! Each poll runs as its own task tagged with a sequence number, so a slow
//! response can never overwrite the result of a poll issued after it.
//! Stopping the poller cancels the timer and aborts any poll in flight.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::protocol::LiveState;
use crate::state::StateManager;
use crate::youtube::VideoPlatform;

pub fn live_embed_url(channel_id: &str) -> String {
    format!(
        "https://www.youtube.com/embed/live_stream?channel={}&autoplay=0",
        channel_id
    )
}

/// Keeps the newest-issued result. Results tagged with a sequence number
/// lower than one already applied are dropped.
#[derive(Debug, Default)]
pub struct SequenceGuard {
    last_applied: Option<u64>,
}

impl SequenceGuard {
    /// Returns true if a result for `seq` should be applied, and records it.
    pub fn admit(&mut self, seq: u64) -> bool {
        match self.last_applied {
            Some(last) if seq < last => false,
            _ => {
                self.last_applied = Some(seq);
                true
            }
        }
    }
}

pub struct LiveStatusPoller {
    platform: Arc<dyn VideoPlatform>,
    state: Arc<StateManager>,
    channel_id: String,
    api_key: String,
    interval: Duration,
}

impl LiveStatusPoller {
    pub fn new(
        platform: Arc<dyn VideoPlatform>,
        state: Arc<StateManager>,
        channel_id: impl Into<String>,
        api_key: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            platform,
            state,
            channel_id: channel_id.into(),
            api_key: api_key.into(),
            interval,
        }
    }

    /// Start polling if both a channel id and an API key are configured.
    /// Otherwise nothing runs and the state stays offline.
    pub fn spawn(
        config: &Config,
        platform: Arc<dyn VideoPlatform>,
        state: Arc<StateManager>,
    ) -> Option<PollerHandle> {
        let (Some(channel_id), Some(api_key)) =
            (config.youtube.channel_id(), config.youtube.api_key())
        else {
            info!("[live] Channel id or API key missing, live polling disabled");
            return None;
        };
        let poller = Self::new(
            platform,
            state,
            channel_id,
            api_key,
            config.live.poll_interval(),
        );
        Some(poller.start())
    }

    /// Run the poll loop on a background task.
    pub fn start(self) -> PollerHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(self.run(token.clone()));
        PollerHandle {
            token,
            task: Some(task),
        }
    }

    async fn run(self, token: CancellationToken) {
        info!(
            "[live] Polling channel {} every {}s",
            self.channel_id,
            self.interval.as_secs()
        );

        // First tick completes immediately.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: JoinSet<(u64, LiveState)> = JoinSet::new();
        let mut guard = SequenceGuard::default();
        let mut next_seq: u64 = 0;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("[live] Poller cancelled, {} polls in flight", in_flight.len());
                    break;
                }
                _ = ticker.tick() => {
                    let seq = next_seq;
                    next_seq += 1;
                    let platform = Arc::clone(&self.platform);
                    let channel_id = self.channel_id.clone();
                    let api_key = self.api_key.clone();
                    in_flight.spawn(async move {
                        (seq, check_live(platform.as_ref(), &channel_id, &api_key).await)
                    });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let (seq, live) = match joined {
                        Ok(r) => r,
                        Err(e) => {
                            warn!("[live] Poll task failed: {}", e);
                            continue;
                        }
                    };
                    if guard.admit(seq) {
                        self.state.set_live(live).await;
                    } else {
                        debug!("[live] Discarding stale poll #{}", seq);
                    }
                }
            }
        }

        in_flight.abort_all();
    }
}

/// One live search. Any failure counts as offline.
pub async fn check_live(platform: &dyn VideoPlatform, channel_id: &str, api_key: &str) -> LiveState {
    match platform.live_videos(channel_id, api_key).await {
        Ok(ids) => match ids.into_iter().next() {
            Some(video_id) => {
                info!("[live] Channel is LIVE: {}", video_id);
                LiveState::live(video_id)
            }
            None => {
                debug!("[live] Channel is offline");
                LiveState::offline()
            }
        },
        Err(e) => {
            warn!("[live] Error checking live status: {}", e);
            LiveState::offline()
        }
    }
}

/// Owner of a running poller. Stopping (or dropping) it cancels the timer
/// exactly once.
pub struct PollerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Cancel the poller and wait for its task to finish.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("[live] Poller task ended abnormally: {}", e);
            }
        }
        info!("[live] Poller stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_guard_drops_older_results() {
        let mut guard = SequenceGuard::default();
        assert!(guard.admit(0));
        assert!(guard.admit(2));
        assert!(!guard.admit(1));
        assert!(guard.admit(2));
        assert!(guard.admit(3));
    }

    #[test]
    fn test_live_embed_url() {
        assert_eq!(
            live_embed_url("UC123"),
            "https://www.youtube.com/embed/live_stream?channel=UC123&autoplay=0"
        );
    }

    #[test]
    fn test_spawn_requires_channel_and_key() {
        // No runtime needed: spawn returns before touching tokio.
        let platform: Arc<dyn VideoPlatform> = Arc::new(NeverPlatform);
        let state = Arc::new(StateManager::new());

        let mut config = Config::default();
        config.youtube.api_key = Some("key".into());
        assert!(LiveStatusPoller::spawn(&config, platform.clone(), state.clone()).is_none());

        let mut config = Config::default();
        config.youtube.channel_id = Some("UC123".into());
        assert!(LiveStatusPoller::spawn(&config, platform, state).is_none());
    }

    struct NeverPlatform;

    #[async_trait::async_trait]
    impl VideoPlatform for NeverPlatform {
        async fn playlist_items(
            &self,
            _: &str,
            _: &str,
            _: u32,
        ) -> Result<Vec<crate::youtube::PlaylistItem>, crate::youtube::FetchError> {
            unreachable!()
        }

        async fn live_videos(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Vec<String>, crate::youtube::FetchError> {
            unreachable!()
        }
    }
}

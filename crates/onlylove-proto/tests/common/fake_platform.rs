#![allow(dead_code)]

use async_trait::async_trait;
use onlylove_proto::youtube::{FetchError, PlaylistItem, VideoPlatform};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted live-search response.
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub result: Result<Vec<String>, String>,
}

impl Step {
    pub fn live(video_id: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(vec![video_id.to_string()]),
        }
    }

    pub fn offline() -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(Vec::new()),
        }
    }

    pub fn fail() -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err("simulated network failure".to_string()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Live search that plays back a script, then answers "offline".
#[derive(Default)]
pub struct ScriptedLive {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedLive {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoPlatform for ScriptedLive {
    async fn playlist_items(
        &self,
        _playlist_id: &str,
        _api_key: &str,
        _max_results: u32,
    ) -> Result<Vec<PlaylistItem>, FetchError> {
        panic!("live poller must not list playlists");
    }

    async fn live_videos(
        &self,
        channel_id: &str,
        api_key: &str,
    ) -> Result<Vec<String>, FetchError> {
        assert_eq!(channel_id, "UC-only-love");
        assert_eq!(api_key, "test-key");
        self.calls.fetch_add(1, Ordering::SeqCst);

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Step::offline);
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.result.map_err(|detail| FetchError::Parse {
            endpoint: "search",
            detail,
        })
    }
}

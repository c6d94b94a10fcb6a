use crate::protocol::{Episode, EpisodeSource, LiveState, SiteState};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared owner of `SiteState`. Every setter bumps `rev`.
#[derive(Default)]
pub struct StateManager {
    state: Arc<RwLock<SiteState>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(&self) -> Arc<RwLock<SiteState>> {
        Arc::clone(&self.state)
    }

    pub async fn get_state(&self) -> SiteState {
        self.state.read().await.clone()
    }

    pub async fn live(&self) -> LiveState {
        self.state.read().await.live.clone()
    }

    pub async fn set_live(&self, live: LiveState) {
        let mut state = self.state.write().await;
        state.live = live;
        state.rev += 1;
    }

    pub async fn set_episodes(&self, episodes: Vec<Episode>, source: EpisodeSource) {
        let mut state = self.state.write().await;
        state.episodes = episodes;
        state.episode_source = source;
        state.rev += 1;
    }
}

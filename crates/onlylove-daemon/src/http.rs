use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use onlylove_proto::contact::{ContactError, ContactRelay};
use onlylove_proto::episodes::EpisodeFeed;
use onlylove_proto::live::live_embed_url;
use onlylove_proto::protocol::{ContactMessage, Episode, EpisodeSource, SiteState};
use onlylove_proto::state::StateManager;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct HttpState {
    pub state_manager: Arc<StateManager>,
    pub feed: Arc<EpisodeFeed>,
    pub contact: Arc<ContactRelay>,
    pub channel_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EpisodesResponse {
    episodes: Vec<Episode>,
    source: EpisodeSource,
    playlist_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LiveResponse {
    is_live: bool,
    live_video_id: Option<String>,
    embed_url: Option<String>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/episodes", get(get_episodes))
        .route("/api/live", get(get_live))
        .route("/api/contact", post(post_contact))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state: HttpState,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(state);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn get_state(State(state): State<HttpState>) -> Json<SiteState> {
    Json(state.state_manager.get_state().await)
}

/// Each request is one page load of the episode section.
async fn get_episodes(State(state): State<HttpState>) -> Json<EpisodesResponse> {
    let result = state.feed.load().await;
    info!(
        "[http] episodes: {} ({:?})",
        result.episodes.len(),
        result.source
    );
    state
        .state_manager
        .set_episodes(result.episodes.clone(), result.source)
        .await;

    Json(EpisodesResponse {
        episodes: result.episodes,
        source: result.source,
        playlist_url: state.feed.playlist_url(),
    })
}

async fn get_live(State(state): State<HttpState>) -> Json<LiveResponse> {
    let live = state.state_manager.live().await;
    let embed_url = match (live.is_live(), state.channel_id.as_deref()) {
        (true, Some(channel)) => Some(live_embed_url(channel)),
        _ => None,
    };
    Json(LiveResponse {
        is_live: live.is_live(),
        live_video_id: live.live_video_id().map(str::to_string),
        embed_url,
    })
}

async fn post_contact(
    State(state): State<HttpState>,
    Json(msg): Json<ContactMessage>,
) -> Response {
    match state.contact.submit(&msg).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "sent" }))).into_response(),
        Err(e) => {
            let status = match e {
                ContactError::MissingField(_) => StatusCode::BAD_REQUEST,
                ContactError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                ContactError::Transport(_) | ContactError::Status(_) => StatusCode::BAD_GATEWAY,
            };
            warn!("[http] contact submission failed: {}", e);
            (status, Json(json!({ "status": "error", "error": e.to_string() }))).into_response()
        }
    }
}

#![allow(dead_code)]

//! In-process stand-in for the YouTube Data API.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct MockState {
    pub playlist_body: Mutex<Option<Value>>,
    pub search_body: Mutex<Option<Value>>,
    /// Status to answer with instead of a body.
    pub status: Mutex<Option<StatusCode>>,
    pub requests: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl MockState {
    pub fn requests(&self) -> Vec<(String, HashMap<String, String>)> {
        self.requests.lock().unwrap().clone()
    }
}

pub struct MockYouTube {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockYouTube {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/youtube/v3/playlistItems", get(playlist_items))
            .route("/youtube/v3/search", get(search))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn api_base(&self) -> String {
        format!("http://{}/youtube/v3", self.addr)
    }
}

fn respond(
    state: &MockState,
    endpoint: &str,
    params: HashMap<String, String>,
    body: Option<Value>,
) -> Response {
    state
        .requests
        .lock()
        .unwrap()
        .push((endpoint.to_string(), params));
    if let Some(status) = *state.status.lock().unwrap() {
        return (status, Json(json!({ "error": { "code": status.as_u16() } }))).into_response();
    }
    Json(body.unwrap_or_else(|| json!({ "items": [] }))).into_response()
}

async fn playlist_items(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let body = state.playlist_body.lock().unwrap().clone();
    respond(&state, "playlistItems", params, body)
}

async fn search(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let body = state.search_body.lock().unwrap().clone();
    respond(&state, "search", params, body)
}

pub fn playlist_item(title: &str, published_at: &str, video_id: &str, description: &str) -> Value {
    json!({
        "kind": "youtube#playlistItem",
        "snippet": {
            "publishedAt": published_at,
            "title": title,
            "description": description,
            "resourceId": { "kind": "youtube#video", "videoId": video_id }
        }
    })
}

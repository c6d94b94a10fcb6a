#![allow(dead_code)]

//! In-process stand-in for the contact form relay.

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One captured submission: multipart fields plus the Accept header.
#[derive(Debug, Clone)]
pub struct RelayedForm {
    pub fields: HashMap<String, String>,
    pub accept: Option<String>,
}

pub struct RelayState {
    pub status: Mutex<StatusCode>,
    pub submissions: Mutex<Vec<RelayedForm>>,
}

impl RelayState {
    pub fn submissions(&self) -> Vec<RelayedForm> {
        self.submissions.lock().unwrap().clone()
    }
}

pub struct MockRelay {
    pub addr: SocketAddr,
    pub state: Arc<RelayState>,
}

impl MockRelay {
    pub async fn start(status: StatusCode) -> Self {
        let state = Arc::new(RelayState {
            status: Mutex::new(status),
            submissions: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/send", post(receive))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/send", self.addr)
    }
}

async fn receive(
    State(state): State<Arc<RelayState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap();
        fields.insert(name, value);
    }
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .submissions
        .lock()
        .unwrap()
        .push(RelayedForm { fields, accept });

    let status = *state.status.lock().unwrap();
    (status, Json(json!({ "success": status.is_success() }))).into_response()
}

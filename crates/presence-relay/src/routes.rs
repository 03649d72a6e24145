//! HTTP handlers: snapshot polling, manual injection, health, and the
//! WebSocket upgrade for observers and network feeds.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use presence_common::IngestError;
use presence_core::ingest::value_to_line;
use serde::Serialize;
use serde_json::Value;

use crate::connection::handle_observer;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct InjectResponse {
    pub ok: bool,
    pub presence: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub observers: usize,
}

/// `GET /api/state`
pub async fn state_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.relay.snapshot().await)
}

/// Pull `raw` out of an injection body. Anything unusable becomes "".
fn raw_field(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("raw") {
            None | Some(Value::Null) => String::new(),
            Some(value) => value_to_line(value),
        },
        _ => String::new(),
    }
}

/// `POST /api/inject` with `{"raw": "..."}`.
pub async fn inject_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let raw = raw_field(&body);
    match state.relay.inject(&raw).await {
        Ok(outcome) => Json(InjectResponse {
            ok: true,
            presence: outcome.presence,
        })
        .into_response(),
        Err(IngestError::InvalidInput(_)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "raw required" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// `GET /api/health`
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        observers: state.relay.hub().count().await,
    })
}

/// WebSocket upgrade on the configured path.
pub async fn ws_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_observer(socket, addr, state.relay, state.send_timeout))
}

//! WebSocket upgrade handling.
//!
//! # Responsibilities
//! - Detect WebSocket upgrade requests on any path
//! - Complete the handshake and hand the socket to the client manager
//!
//! # Data Flow
//! ```text
//! Client ──── upgrade (?user=&type=) ────→ Edge ──→ WsClientManager session
//! ```
//!
//! # Design Decisions
//! - Upgrades are checked before routing, so no route can shadow them
//! - Handshake failures answer with axum's rejection response

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, FromRequestParts},
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;
use crate::routing::split_query;

/// True if the request asks for a WebSocket upgrade.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Complete the handshake and start a client session.
pub async fn upgrade(state: &AppState, request: Request<Body>) -> Response {
    let (mut parts, _body) = request.into_parts();

    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let (path, query) = split_query(target);
    let user = query.get("user").cloned();
    let kind = query.get("type").map(String::as_str).unwrap_or("all");

    tracing::debug!(
        path = %path,
        user = user.as_deref().unwrap_or(""),
        kind = %kind,
        "WebSocket upgrade requested"
    );

    match <WebSocketUpgrade as FromRequestParts<AppState>>::from_request_parts(&mut parts, state).await {
        Ok(ws) => {
            let manager = state.ws_clients.clone();
            ws.on_upgrade(move |socket| manager.run_session(socket, user))
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "WebSocket handshake rejected");
            rejection.into_response()
        }
    }
}

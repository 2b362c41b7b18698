//! Per-request dispatch.
//!
//! # Data Flow
//! ```text
//! request
//!     → WebSocket upgrade?          → websocket.rs
//!     → OPTIONS?                    → CORS preflight
//!     → route table match           → callback(RouteRequest), exactly once
//!     → no match, GET/HEAD          → static_files.rs
//!     → no match, other methods     → 400 Unknown HTTP-method
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    response::Response,
};

use crate::http::request::RequestIdExt;
use crate::http::route::{RouteCallback, RouteRequest};
use crate::http::server::AppState;
use crate::http::{response, static_files, websocket};
use crate::observability::metrics;
use crate::routing::{MatchResult, RoutePath};

/// Catch-all handler behind every path.
pub async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request.request_id().unwrap_or_default().to_string();

    let (response, outcome) = route_request(&state, request, &request_id).await;

    metrics::record_request(method.as_str(), response.status().as_u16(), outcome, start);
    tracing::info!(
        request_id = %request_id,
        remote = %remote,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        outcome,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}

async fn route_request(
    state: &AppState,
    request: Request<Body>,
    request_id: &str,
) -> (Response, &'static str) {
    if websocket::is_upgrade_request(request.headers()) {
        return (websocket::upgrade(state, request).await, "websocket");
    }

    if request.method() == Method::OPTIONS {
        return (response::preflight(), "preflight");
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    match state
        .routes
        .match_route(&RoutePath::new(request.method().clone(), target.as_str()))
    {
        Ok(matched) => {
            metrics::record_route_lookup("matched");
            (invoke(state, matched, request, request_id).await, "route")
        }
        Err(e) => {
            metrics::record_route_lookup("not_found");
            tracing::debug!(request_id = %request_id, error = %e, "Falling back to static files");
            fallback(state, request).await
        }
    }
}

async fn invoke(
    state: &AppState,
    matched: MatchResult<RouteCallback>,
    request: Request<Body>,
    request_id: &str,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            return response::payload_too_large(state.max_body_bytes);
        }
    };

    let route_request = RouteRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
        parameters: matched.parameters,
        query: matched.query,
        request_id: request_id.to_string(),
        db: state.db.clone(),
        publisher: state.publisher.clone(),
        routes: state.routes.clone(),
    };

    matched.handler.dispatch(route_request).await
}

async fn fallback(state: &AppState, request: Request<Body>) -> (Response, &'static str) {
    let method = request.method();
    if method != Method::GET && method != Method::HEAD {
        return (response::bad_request("Unknown HTTP-method"), "error");
    }

    if !static_files::is_legal_target(request.uri().path()) {
        return (response::bad_request("Illegal request-target"), "error");
    }

    (static_files::serve(&state.doc_root, request).await, "static")
}

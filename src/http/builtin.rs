//! Routes every deployment carries.
//!
//! - `GET /health`: liveness
//! - `GET /health/db`: database round trip
//! - `GET /api/v1/routes`: registered route keys, in declaration order
//! - `PUT /api/v1/events/{subject}`: publish the body on the bus

use axum::response::Response;
use serde_json::json;

use crate::http::response;
use crate::http::route::{callback, RouteRequest, RouteTable};
use crate::routing::RouteError;

/// Declare the built-in routes on `routes`.
pub fn register_builtin_routes(routes: &mut RouteTable) -> Result<(), RouteError> {
    routes.get("/health", callback(health))?;
    routes.get("/health/db", callback(database_health))?;
    routes.get("/api/v1/routes", callback(list_routes))?;
    routes.put("/api/v1/events/{subject}", callback(publish_event))?;
    Ok(())
}

async fn health(_request: RouteRequest) -> Response {
    response::success(json!({ "status": "ok" }))
}

async fn database_health(request: RouteRequest) -> Response {
    match request.db.query("SELECT 1 AS ok").await {
        Ok(_) => response::success(json!({ "status": "ok", "database": "up" })),
        Err(e) => {
            tracing::warn!(request_id = %request.request_id, error = %e, "Database health check failed");
            response::unavailable("Database unavailable")
        }
    }
}

async fn list_routes(request: RouteRequest) -> Response {
    let routes: Vec<_> = request
        .routes
        .registered_ids()
        .into_iter()
        .map(|id| json!({ "method": id.method.as_str(), "path": id.path }))
        .collect();
    response::success(json!(routes))
}

async fn publish_event(request: RouteRequest) -> Response {
    let subject = request.param("subject");
    let payload = match request.text() {
        Ok(text) => text,
        Err(_) => return response::bad_request("Event payload must be UTF-8"),
    };

    request.publisher.send(subject, payload);
    tracing::info!(request_id = %request.request_id, subject = %subject, "Event published");
    response::success(json!({ "published": subject }))
}

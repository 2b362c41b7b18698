//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, status, outcome
//! - `edge_request_duration_seconds` (histogram): latency distribution
//! - `edge_route_lookups_total` (counter): route matches by result
//! - `edge_ws_clients` (gauge): registered WebSocket clients
//! - `edge_pubsub_events_total` (counter): published events by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
///
/// `outcome` is one of `route`, `static`, `websocket`, `preflight` or `error`.
pub fn record_request(method: &str, status: u16, outcome: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("outcome", outcome.to_string()),
    ];
    metrics::counter!("edge_requests_total", &labels).increment(1);
    metrics::histogram!("edge_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a route lookup (`matched` or `not_found`).
pub fn record_route_lookup(result: &'static str) {
    metrics::counter!("edge_route_lookups_total", "result" => result).increment(1);
}

pub fn record_ws_clients(count: usize) {
    metrics::gauge!("edge_ws_clients").set(count as f64);
}

pub fn record_pubsub_event(outcome: &'static str) {
    metrics::counter!("edge_pubsub_events_total", "outcome" => outcome).increment(1);
}

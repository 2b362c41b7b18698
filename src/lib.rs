//! LivePosts edge server library.
//!
//! An HTTP/WebSocket edge server that matches requests against declared
//! URL templates, hands matched requests to async callbacks together with a
//! database client and a pub/sub sender, and serves static files otherwise.

pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pubsub;
pub mod routing;
pub mod ws;

pub use config::EdgeConfig;
pub use http::{callback, HttpServer, RouteRequest, RouteTable, Services};
pub use lifecycle::Shutdown;
pub use routing::{RouteError, RoutePath, RouteRegistry};

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → session.rs (upgrade / preflight / route / static fallback)
//!     → route.rs (RouteRequest handed to the matched callback)
//!     → response.rs (JSON + CORS)
//!     → Send to client
//! ```

pub mod builtin;
pub mod request;
pub mod response;
pub mod route;
pub mod server;
pub mod session;
pub mod static_files;
pub mod websocket;

pub use builtin::register_builtin_routes;
pub use request::{RequestId, RequestIdExt, X_REQUEST_ID};
pub use route::{callback, RouteCallback, RouteRequest, RouteTable};
pub use server::{AppState, HttpServer, Services};

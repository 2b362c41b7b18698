//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Declaration (at startup):
//!     RoutePath { method, "/api/v1/user/fetchbyid/{id}" }
//!     → pattern.rs (literals + trailing variables)
//!     → registry.rs (ordered scan list + exact binding map)
//!
//! Incoming Request (method, raw target):
//!     → segments.rs (split off query, segment path)
//!     → matcher.rs (truncation search, bind variables)
//!     → handler.rs (fresh handler with callback attached)
//!     → Return: MatchResult or RouteError::NotFound
//! ```
//!
//! # Design Decisions
//! - Registry is built once and shared read-only afterwards
//! - Generic over the callback type; no dependency on the HTTP layer
//! - Deterministic: same registry and request always give the same match
//! - First match wins (ordered by declaration)

pub mod error;
pub mod handler;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod registry;
pub mod segments;

pub use error::{RouteError, SyntaxReason, TemplateSyntaxError};
pub use handler::{HandlerBinding, HandlerFactory, HttpRoute};
pub use matcher::MatchResult;
pub use params::Parameters;
pub use pattern::{decompose, RouteTemplate};
pub use registry::{RegisteredRoute, RoutePath, RouteRegistry};
pub use segments::{decoded_query, segments, split_query, QueryParams};

//! HTTP binding of the routing core.
//!
//! Route callbacks are async closures taking a `RouteRequest` and returning
//! a response. The route table is the generic registry specialised to them.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::db::Database;
use crate::http::response;
use crate::pubsub::Publisher;
use crate::routing::{HttpRoute, Parameters, QueryParams, RouteRegistry};

/// Everything a route callback gets for one request.
pub struct RouteRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Path variables bound by the matcher.
    pub parameters: Parameters,
    /// Query-string pairs, undecoded.
    pub query: QueryParams,
    pub request_id: String,
    pub db: Arc<dyn Database>,
    pub publisher: Arc<dyn Publisher>,
    pub routes: Arc<RouteTable>,
}

impl RouteRequest {
    /// Path variable by name; empty if unbound.
    pub fn param(&self, name: &str) -> &str {
        &self.parameters[name]
    }

    /// Query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

pub type RouteCallback = Arc<dyn Fn(RouteRequest) -> BoxFuture<'static, Response> + Send + Sync>;

pub type RouteTable = RouteRegistry<RouteCallback>;

/// Wrap an async function as a route callback.
pub fn callback<F, Fut>(f: F) -> RouteCallback
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request: RouteRequest| -> BoxFuture<'static, Response> { Box::pin(f(request)) })
}

impl HttpRoute<RouteCallback> {
    /// Run the attached callback once. Unbound handlers answer 501.
    pub async fn dispatch(self, request: RouteRequest) -> Response {
        match self.into_callback() {
            Some(callback) => callback(request).await,
            None => {
                tracing::warn!(request_id = %request.request_id, "Route has no callback");
                response::not_implemented()
            }
        }
    }
}

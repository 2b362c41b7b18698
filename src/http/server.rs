//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all dispatcher
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Run the WebSocket relay alongside the server
//! - Drain in-flight requests on shutdown

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::EdgeConfig;
use crate::db::Database;
use crate::http::request::request_id_middleware;
use crate::http::route::RouteTable;
use crate::http::session::dispatch;
use crate::pubsub::{BroadcastBus, Publisher};
use crate::ws::WsClientManager;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub db: Arc<dyn Database>,
    pub publisher: Arc<dyn Publisher>,
    pub ws_clients: Arc<WsClientManager>,
    pub doc_root: PathBuf,
    pub max_body_bytes: usize,
}

/// Collaborators the server is built from.
pub struct Services {
    /// Fully declared route table; read-only once the server exists.
    pub routes: RouteTable,
    pub db: Arc<dyn Database>,
    pub bus: BroadcastBus,
}

/// HTTP/WebSocket edge server.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
    ws_clients: Arc<WsClientManager>,
    bus: BroadcastBus,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EdgeConfig, services: Services) -> Self {
        let ws_clients = Arc::new(WsClientManager::new(
            config.websocket.max_clients,
            config.websocket.default_user.clone(),
        ));

        tracing::info!(routes = services.routes.len(), "Route table frozen");

        let state = AppState {
            routes: Arc::new(services.routes),
            db: services.db,
            publisher: Arc::new(services.bus.clone()),
            ws_clients: ws_clients.clone(),
            doc_root: PathBuf::from(&config.static_files.doc_root),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            ws_clients,
            bus: services.bus,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            doc_root = %self.config.static_files.doc_root,
            "HTTP server starting"
        );

        let relay = self
            .ws_clients
            .clone()
            .spawn_relay(&self.bus, shutdown.resubscribe());

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        relay.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    pub fn ws_clients(&self) -> &Arc<WsClientManager> {
        &self.ws_clients
    }
}

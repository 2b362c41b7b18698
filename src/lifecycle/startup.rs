//! Startup orchestration.
//!
//! # Responsibilities
//! - Declare routes and freeze the route table
//! - Initialize collaborators (metrics, database pool, pub/sub bus)
//! - Bind the listener and begin accepting traffic
//! - Turn OS signals into a graceful shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Routes are complete before the listener binds
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::EdgeConfig;
use crate::db::PgDatabase;
use crate::http::{register_builtin_routes, HttpServer, RouteTable, Services};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::pubsub::BroadcastBus;
use crate::routing::RouteError;

/// Fatal startup failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("route declaration failed: {0}")]
    Routes(#[from] RouteError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Route table with the built-in routes declared.
pub fn default_routes() -> Result<RouteTable, RouteError> {
    let mut routes = RouteTable::new();
    register_builtin_routes(&mut routes)?;
    Ok(routes)
}

/// Start the server with the built-in routes and run until a signal arrives.
pub async fn run(config: EdgeConfig) -> Result<(), StartupError> {
    let routes = default_routes()?;
    run_with_routes(config, routes).await
}

/// Start the server with a caller-declared route table.
pub async fn run_with_routes(config: EdgeConfig, routes: RouteTable) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let db = Arc::new(PgDatabase::connect_lazy(&config.database));
    let bus = BroadcastBus::new(config.pubsub.channel.clone(), config.pubsub.capacity);

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        let signal = signals::wait_for_signal().await;
        trigger.trigger(signal);
    });

    let server = HttpServer::new(config, Services { routes, db, bus });
    server
        .run(listener, server_shutdown)
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}

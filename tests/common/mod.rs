//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpListener;

use liveposts_edge::config::EdgeConfig;
use liveposts_edge::db::{Database, DbError};
use liveposts_edge::http::{HttpServer, RouteTable, Services};
use liveposts_edge::lifecycle::{default_routes, Shutdown};
use liveposts_edge::pubsub::BroadcastBus;

/// In-memory database that answers every query with fixed rows
/// and records what it was asked.
#[derive(Default)]
pub struct FakeDatabase {
    pub rows: Vec<Value>,
    pub fail: bool,
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
}

#[allow(dead_code)]
impl FakeDatabase {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn param_query(&self, sql: &str, params: &[String]) -> Result<Vec<Value>, DbError> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if self.fail {
            return Err(DbError::Unavailable("fake database is down".into()));
        }
        Ok(self.rows.clone())
    }
}

/// A running server plus what a test needs to talk to it.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub bus: BroadcastBus,
    pub doc_root: PathBuf,
    pub handle: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger("test finished");
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), self.handle).await;
        let _ = std::fs::remove_dir_all(&self.doc_root);
    }
}

/// Document root with `index.html` and `hello.txt`.
fn make_doc_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("liveposts-edge-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::write(root.join("index.html"), "<h1>liveposts</h1>").unwrap();
    std::fs::write(root.join("hello.txt"), "hello from disk").unwrap();
    std::fs::write(root.join("docs").join("index.html"), "<h1>docs</h1>").unwrap();
    root
}

/// Start a server on an ephemeral port with the built-in routes plus `extra`.
#[allow(dead_code)]
pub async fn start_server(
    db: Arc<dyn Database>,
    extra: impl FnOnce(&mut RouteTable),
) -> TestServer {
    start_server_with(EdgeConfig::default(), db, extra).await
}

pub async fn start_server_with(
    mut config: EdgeConfig,
    db: Arc<dyn Database>,
    extra: impl FnOnce(&mut RouteTable),
) -> TestServer {
    let doc_root = make_doc_root();
    config.static_files.doc_root = doc_root.to_string_lossy().into_owned();

    let mut routes = default_routes().unwrap();
    extra(&mut routes);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let bus = BroadcastBus::new("test", 64);
    let shutdown = Shutdown::new();
    let server = HttpServer::new(
        config,
        Services {
            routes,
            db,
            bus: bus.clone(),
        },
    );

    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestServer {
        addr,
        shutdown,
        bus,
        doc_root,
        handle,
    }
}

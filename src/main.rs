//! LivePosts edge server (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────────┐
//!                    │                    EDGE SERVER                     │
//!                    │                                                    │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌──────────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ session  │───▶│   routing    │   │
//!                    │  │ server  │    │ dispatch │    │   registry   │   │
//!                    │  └─────────┘    └────┬─────┘    └──────┬───────┘   │
//!                    │                      │                 │           │
//!                    │          ┌───────────┼─────────┐       ▼           │
//!                    │          ▼           ▼         │  ┌──────────┐     │
//!                    │   ┌───────────┐ ┌──────────┐   │  │ callback │──┐  │
//!                    │   │ websocket │ │  static  │   │  └──────────┘  │  │
//!                    │   │  clients  │ │  files   │   │                │  │
//!                    │   └─────▲─────┘ └──────────┘   │   ┌────────┐   │  │
//!                    │         │                      │   │   db   │◀──┤  │
//!                    │         │      ┌────────────┐  │   └────────┘   │  │
//!                    │         └──────│ pubsub bus │◀─┼────────────────┘  │
//!                    │                └────────────┘  │                   │
//!                    └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use liveposts_edge::config::{resolve_config, ConfigOverrides};
use liveposts_edge::lifecycle;
use liveposts_edge::observability::logging::init_logging;

/// HTTP/WebSocket edge server.
#[derive(Debug, Parser)]
#[command(name = "liveposts-edge", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening address.
    #[arg(long)]
    address: Option<String>,

    /// Listening port.
    #[arg(long)]
    port: Option<u16>,

    /// Worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Document root folder.
    #[arg(long)]
    root: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        address: cli.address,
        port: cli.port,
        threads: cli.threads,
        root: cli.root,
    };

    let config = resolve_config(cli.config.as_deref(), &overrides, |key| std::env::var(key).ok())?;
    init_logging(&config.observability)?;

    tracing::info!("liveposts-edge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        worker_threads = config.listener.worker_threads,
        doc_root = %config.static_files.doc_root,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.listener.worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(lifecycle::run(config))?;
    Ok(())
}

//! To-do API service (one replica).
//!
//! A minimal task-list API meant to run as several instances behind a
//! health-checking load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                TO-DO API INSTANCE              │
//!                      │                                                │
//!   Load balancer      │  ┌─────────┐    ┌──────────┐    ┌───────────┐ │
//!   ───────────────────┼─▶│  http   │───▶│  tasks   │───▶│   store   │─┼──▶ KV store
//!                      │  │ server  │    │ service  │    │ (list key)│ │
//!                      │  └────┬────┘    └──────────┘    └───────────┘ │
//!                      │       │                                        │
//!                      │       ├────────▶ stress (memory block pool)    │
//!                      │       │                                        │
//!   GET /api/health    │       └────────▶ health (memory + store ping)  │
//!   ◀──────────────────┼─── 200 OK / 503 UNHEALTHY / 500 ERROR          │
//!                      │                                                │
//!                      │  config · observability · lifecycle            │
//!                      └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::Instrument;

use todo_failover::config::load_config;
use todo_failover::http::HttpServer;
use todo_failover::lifecycle::{bootstrap, signals, Shutdown};
use todo_failover::observability::logging;

#[derive(Parser)]
#[command(name = "todo-api")]
#[command(about = "To-do API instance with memory-based health reporting", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "TODO_API_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability)?;

    let span = tracing::info_span!(
        "todo-api",
        service = env!("CARGO_PKG_NAME"),
        instance = %config.instance.id
    );

    async move {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            bind_address = %config.server.bind_address,
            store_backend = ?config.store.backend,
            "Configuration loaded"
        );

        let state = bootstrap(&config).await?;

        let listener = TcpListener::bind(&config.server.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Listening for connections");

        let shutdown = Shutdown::new();
        signals::spawn_signal_listener(shutdown.clone());

        let server = HttpServer::new(state, &config.server);
        server.run(listener, shutdown).await?;

        tracing::info!("Shutdown complete");
        Ok::<(), Box<dyn std::error::Error>>(())
    }
    .instrument(span)
    .await
}

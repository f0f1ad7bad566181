//! action-router demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (Axum, middleware)
//!                         │
//!                         ▼
//!                     routing::Mapper ──── static mounts (ServeDir)
//!                         │
//!                         ▼
//!                     routing::Dispatcher ── not_found fallback
//!                         │
//!                         ▼
//!                     Processor action(RequestView) → ResponseBuilder
//! ```

mod demo;

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use action_router::config::{load_config, ServerConfig};
use action_router::http::HttpServer;
use action_router::lifecycle::{signals, Shutdown};
use action_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "action-router")]
#[command(about = "Serve a processor's actions over HTTP", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("action-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.timeouts.request_secs,
        static_mounts = config.static_mounts.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut mapper = HttpServer::mapper_for(&config, demo::Demo);
    demo::bind_routes(&mut mapper)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, mapper)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Order service (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum, request id, trace, timeout)
//!                        │
//!                        ▼
//!                   OrderService ─────────────▶ EventNotifier ──▶ publisher
//!                    │        │                 (retry, timeout,   (memory / kafka)
//!                    │        │                  dead letters)
//!                    ▼        ▼
//!                  cache     store
//!            (memory/redis)  (memory/postgres, behind ResilientStore)
//!
//!     Cross-cutting: config · observability (tracing, metrics) · lifecycle
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use order_service::config::{self, ServiceConfig};
use order_service::http::HttpServer;
use order_service::lifecycle::{build_service, signals, Shutdown};
use order_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "order-service")]
#[command(about = "Order management service with cache-aside reads", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults plus environment
    /// overrides are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config: ServiceConfig = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_from_env()?,
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "order-service starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        store = ?config.store.backend,
        cache = ?config.cache.backend,
        events = ?config.events.backend,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::error!(error = %err, "Metrics disabled");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let service = build_service(&config, &shutdown).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    signals::spawn_signal_handler(shutdown.clone());

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let server = HttpServer::new(Arc::new(config), service);
    let mut serving = tokio::spawn(server.run(listener, shutdown.clone()));

    tokio::select! {
        result = &mut serving => result??,
        _ = shutdown.wait() => {
            match tokio::time::timeout(grace, &mut serving).await {
                Ok(result) => result??,
                Err(_) => tracing::warn!(grace = ?grace, "Connections still open after grace period"),
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

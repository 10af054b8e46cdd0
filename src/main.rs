//! Order Service
//!
//! Accepts orders over HTTP, checking stock and price with the parts service
//! through a circuit breaker.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                    ORDER SERVICE                     │
//!                 │                                                      │
//!  Client Request │  ┌─────────┐    ┌──────────┐    ┌────────────────┐   │
//!  ───────────────┼─▶│  http   │───▶│  orders  │───▶│   resilience   │   │
//!                 │  │ server  │    │ workflow │    │circuit breaker │   │
//!                 │  └─────────┘    └────┬─────┘    └───────┬────────┘   │
//!                 │                      │                  │            │
//!                 │                      ▼                  ▼            │
//!                 │                ┌──────────┐    ┌────────────────┐    │   Parts
//!                 │                │  orders  │    │     parts      │────┼─▶ Service
//!                 │                │  store   │    │     client     │    │
//!                 │                └──────────┘    └────────────────┘    │
//!                 │                                                      │
//!                 │  config · observability · lifecycle                  │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use order_service::config::loader;
use order_service::observability::{logging, metrics};
use order_service::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "order-service")]
#[command(
    about = "Order API guarded by a circuit breaker around the parts service",
    long_about = None
)]
struct Args {
    /// Path to a TOML config file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = loader::load(args.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!("order-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        parts_url = %config.parts.base_url,
        parts_timeout_ms = config.parts.timeout_ms,
        failure_threshold = config.breaker.failure_threshold,
        cooldown_ms = config.breaker.cooldown_ms,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { shutdown.trigger_on_signal().await }
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

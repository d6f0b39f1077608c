//! Tenant Router
//!
//! HTTP edge service that decides, for every request, which tenant surface
//! owns it, which route applies, which redirects rewrite it and whether the
//! caller may proceed.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────────┐
//!                         │                    TENANT ROUTER                      │
//!                         │                                                       │
//!   Client Request        │  ┌─────────┐    ┌────────────┐    ┌───────────────┐   │
//!   ──────────────────────┼─▶│  http   │───▶│  dispatch  │───▶│    domain     │   │
//!                         │  │ server  │    │ dispatcher │    │   registry    │   │
//!                         │  └─────────┘    └─────┬──────┘    └───────────────┘   │
//!                         │                       │                               │
//!                         │          ┌────────────┼─────────────┐                 │
//!                         │          ▼            ▼             ▼                 │
//!                         │   ┌──────────┐  ┌──────────┐  ┌──────────┐            │
//!                         │   │ redirect │  │ routing  │  │  guard   │◀── directory│
//!                         │   │  rules   │  │  table   │  │  chain   │            │
//!                         │   └──────────┘  └──────────┘  └──────────┘            │
//!                         │                                                       │
//!   200 / 302 / 404 / 421 │  ┌─────────┐                                          │
//!   ◀─────────────────────┼──│response │◀── DispatchOutcome                       │
//!                         │  └─────────┘                                          │
//!                         │                                                       │
//!                         │   config · observability · lifecycle                  │
//!                         └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use tenant_router::config::{load_config, RouterConfig};
use tenant_router::http::HttpServer;
use tenant_router::lifecycle::{build_dispatcher, spawn_signal_handler, Shutdown};
use tenant_router::observability::{init_logging, init_metrics};

#[derive(Parser)]
#[command(name = "tenant-router", version, about = "Multi-domain request router")]
struct Cli {
    /// Configuration file (TOML); defaults apply when omitted
    #[arg(short, long, env = "TENANT_ROUTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    init_logging(&config.observability.log_level)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tenant-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_domain = %config.base_domain,
        guard_timeout_ms = config.dispatch.guard_timeout_ms,
        prefetch_guards = config.dispatch.prefetch_guards,
        "Configuration loaded"
    );

    let dispatcher = Arc::new(build_dispatcher(&config)?);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_handler(Arc::clone(&shutdown));

    HttpServer::new(dispatcher, &config.listener, shutdown)
        .run(listener)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

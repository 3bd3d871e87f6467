//! Course platform forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http::server ──▶ forward::RequestForwarder │
//!       /api/{*path}           │   (request id,     (headers, body kind,      │
//!                              │    trace, limit)    target url)              │
//!                              │                          │                   │
//!     Client Response          │                          ▼                   │
//!     ◀────────────────────────┼── http::response ◀── reqwest client ◀────────┼──── Backend
//!       (status, headers,      │   (passthrough)     (no redirects)           │     origin
//!        streamed body)        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use course_proxy::config::{load_config, validate_config, ConfigError, ForwarderConfig};
use course_proxy::lifecycle::{shutdown_signal, Shutdown};
use course_proxy::observability::{logging, metrics};
use course_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "course-proxy")]
#[command(about = "Forwards requests under a local prefix to the course platform backend", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the upstream origin.
    #[arg(short, long)]
    upstream: Option<String>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ForwarderConfig::default(),
    };
    if let Some(origin) = cli.upstream {
        config.upstream.origin = origin;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);

    tracing::info!("course-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefix = %config.listener.prefix,
        upstream = %config.upstream.origin,
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

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

// exporter/src/main.rs

//! Exporter binary.
//!
//! Serves on-demand Prometheus metrics for a Cosmos-based node:
//!
//! - `GET /metrics/proposals`
//! - `GET /metrics/upgrade`
//! - `GET /health`
//!
//! Nothing is collected in the background; every scrape queries the node
//! through a single shared HTTP client.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use chain::{HttpNodeClient, NodeQuery};
use exporter::config::Cli;
use exporter::{AppState, SharedState, build_router};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        tracing::error!("fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("exporter=info,chain=info,tower_http=warn"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = cli.into_config().context("invalid configuration")?;

    // ---------------------------
    // Node client (shared, read-only)
    // ---------------------------

    let client: Arc<dyn NodeQuery> = Arc::new(
        HttpNodeClient::from_config(&cfg.node).context("failed to create node client")?,
    );
    tracing::info!(node = %cfg.node.base_url, "querying node");

    // ---------------------------
    // Shared state + router
    // ---------------------------

    let state: SharedState = Arc::new(AppState::from_config(&cfg, client));
    let app = build_router(state);

    tracing::info!(
        "exporter listening on http://{}/metrics/{{proposals,upgrade}}",
        cfg.metrics.listen_addr
    );

    let listener = tokio::net::TcpListener::bind(cfg.metrics.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.metrics.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

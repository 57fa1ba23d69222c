//! cardash-sw server entry point.
//!
//! Boots the offline worker, installs it, and exposes it as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use cardash_core::{AppConfig, CacheDb};
use cardash_worker::{FetchClient, FetchConfig, Worker, WorkerConfig};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, db_path = %config.db_path.display(), "Starting cardash-sw on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = Arc::new(Worker::new(db, Arc::new(network), WorkerConfig::from_app_config(&config)?));

    match worker.install().await {
        Ok(report) => tracing::info!(
            cached = report.cached.len(),
            failed = report.failed.len(),
            activated = report.activated.is_some(),
            "worker installed"
        ),
        Err(e) => tracing::error!(error = %e, "worker install failed"),
    }

    let handler = handler::CarDashServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

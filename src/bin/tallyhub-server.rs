// ABOUTME: TallyHub server binary wiring configuration, store, resources, and the HTTP listener
// ABOUTME: Shuts bot sessions down gracefully on Ctrl-C
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TallyHub Contributors

//! # TallyHub Server Binary
//!
//! Starts the counter trigger API, the overlay websocket endpoint, and the settings routes
//! on a single port.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tallyhub_server::{
    config::{ServerConfig, StoreUrl},
    logging,
    resources::ServerResources,
    routes, store,
};
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tallyhub-server")]
#[command(about = "TallyHub - stream counters with overlay, Discord, and chat fan-out")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the counter store (`memory` or `sqlite:<path>`)
    #[arg(long)]
    store_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(store_url) = args.store_url.as_deref() {
        config.store_url = StoreUrl::parse_url(store_url)?;
    }
    config.validate()?;

    info!(
        environment = %config.environment,
        http_port = config.http_port,
        "Starting TallyHub server"
    );

    let store = store::open_store(&config.store_url)
        .await
        .context("Failed to open counter store")?;
    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(config, store));

    let app = routes::router(&resources);
    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {addr}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
    }

    resources.shutdown().await;
    info!("TallyHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// node-api/src/main.rs

//! Notary node binary.
//!
//! This binary exposes the notary node operations over HTTP on top of the
//! `notary-chain` crate:
//!
//! - `POST /documents`, `POST /documents/verify`
//! - `GET /chain`, `POST /chain/pull`, `POST /chain/sync`
//! - `POST /blocks`, `POST /blocks/mine`
//! - `POST /transactions`, `POST /transactions/verify`
//! - `GET /peers`, `POST /peers`, `POST /peers/register`
//! - `GET /health`
//!
//! It joins the cluster through the optional bootstrap node at startup and
//! runs a Prometheus metrics exporter on `/metrics` when enabled.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use config::Args;
use notary_chain::{HttpAnchor, HttpPeerClient, MetricsRegistry, Node, run_prometheus_http_server};
use state::SharedState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notary_node=info,notary_chain=info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), String> {
    let listen_addr = args.listen;
    let config = args
        .into_node_config()
        .map_err(|e| format!("invalid configuration: {e}"))?;

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if config.metrics.enabled {
        let exporter = metrics.clone();
        let addr = config.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(exporter, addr).await {
                tracing::error!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Node
    // ---------------------------

    let client = HttpPeerClient::new(config.replication.attempt_timeout)
        .map_err(|e| format!("failed to create peer client: {e}"))?;
    let anchor = config
        .anchor
        .as_ref()
        .map(|a| HttpAnchor::new(a.url.clone(), a.timeout))
        .transpose()
        .map_err(|e| format!("failed to create anchor client: {e}"))?;

    let mut node = Node::new(config, client)
        .map_err(|e| format!("failed to create node: {e}"))?
        .with_metrics(metrics);
    if let Some(anchor) = anchor {
        tracing::info!(url = %anchor.url(), "anchor enabled");
        node = node.with_anchor(anchor);
    }
    let node: SharedState = Arc::new(node);

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = routes::router(node.clone());

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| format!("failed to bind {listen_addr}: {e}"))?;
    tracing::info!(endpoint = %node.endpoint(), "notary node listening on http://{}", listen_addr);

    // The bootstrap node probes us back, so join after binding.
    let joining = node.clone();
    tokio::spawn(async move {
        if let Err(e) = joining.join().await {
            tracing::warn!(error = %e, "could not join cluster, running standalone");
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

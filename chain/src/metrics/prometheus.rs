//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed ledger metrics, and an
//! async HTTP exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::{debug, warn};

/// Ledger and admission Prometheus metrics.
///
/// These are registered into a [`Registry`] and updated by the node.
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Wall time of one proof-of-work search, in seconds.
    pub pow_seconds: Histogram,
    /// Blocks sealed locally.
    pub blocks_sealed: IntCounter,
    /// Peer blocks by acceptance verdict.
    pub peer_blocks: IntCounterVec,
    /// Wholesale chain replacements.
    pub chain_replacements: IntCounter,
    /// Admission outcomes by error class (`accepted` on success).
    pub admissions: IntCounterVec,
    /// Chain length, genesis included.
    pub chain_length: IntGauge,
    /// Known peers, this node included.
    pub known_peers: IntGauge,
}

impl LedgerMetrics {
    /// Registers ledger metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let pow_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_pow_seconds",
                "Time to find a proof-of-work answer in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
        )?;
        registry.register(Box::new(pow_seconds.clone()))?;

        let blocks_sealed = IntCounter::with_opts(Opts::new(
            "ledger_blocks_sealed",
            "Total number of blocks sealed by this node",
        ))?;
        registry.register(Box::new(blocks_sealed.clone()))?;

        let peer_blocks = IntCounterVec::new(
            Opts::new(
                "ledger_peer_blocks",
                "Blocks received from peers, by acceptance verdict",
            ),
            &["verdict"],
        )?;
        registry.register(Box::new(peer_blocks.clone()))?;

        let chain_replacements = IntCounter::with_opts(Opts::new(
            "ledger_chain_replacements",
            "Total number of times the local chain was replaced by a peer's",
        ))?;
        registry.register(Box::new(chain_replacements.clone()))?;

        let admissions = IntCounterVec::new(
            Opts::new("admission_outcomes", "Document submissions by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(admissions.clone()))?;

        let chain_length = IntGauge::with_opts(Opts::new(
            "ledger_chain_length",
            "Number of blocks in the local chain",
        ))?;
        registry.register(Box::new(chain_length.clone()))?;

        let known_peers = IntGauge::with_opts(Opts::new(
            "peers_known",
            "Number of known peer endpoints, this node included",
        ))?;
        registry.register(Box::new(known_peers.clone()))?;

        Ok(Self {
            pow_seconds,
            blocks_sealed,
            peer_blocks,
            chain_replacements,
            admissions,
            chain_length,
            known_peers,
        })
    }
}

/// Wrapper around a Prometheus registry and the ledger metrics.
///
/// This is the main handle you pass around in the node. It can be wrapped
/// in an [`Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub ledger: LedgerMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the ledger metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("notary".to_string()), None)?;
        let ledger = LedgerMetrics::register(&registry)?;
        Ok(Self { registry, ledger })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
///
/// This function is `async` and is intended to be spawned onto a Tokio
/// runtime, e.g.:
///
/// ```ignore
/// let registry = Arc::new(MetricsRegistry::new()?);
/// let addr: SocketAddr = "127.0.0.1:9898".parse()?;
/// tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
/// ```
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                debug!(error = %err, "metrics connection closed with error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let resp = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let mut resp = Response::new(Full::new(Bytes::from(metrics.gather_text())));
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            resp
        }
        _ => {
            let mut resp = Response::new(Full::new(Bytes::from("not found")));
            *resp.status_mut() = StatusCode::NOT_FOUND;
            resp
        }
    };
    Ok(resp)
}

//! Top-level configuration for a notary node.
//!
//! This module aggregates configuration for:
//!
//! - the ledger (`LedgerConfig`: proof-of-work timeout, seal retries),
//! - replication (`ReplicationConfig`: retries, timeouts, backoff),
//! - admission (`AdmissionConfig`: fingerprint scheme, threshold, blacklist),
//! - the metrics exporter (enable flag + listen address),
//! - membership (own endpoint, optional bootstrap) and the optional anchor.
//!
//! The goal is to have a single `NodeConfig` struct that the node binary
//! can construct from defaults and overlay with CLI flags or environment
//! variables.

use std::net::SocketAddr;
use std::time::Duration;

use crate::admission::AdmissionConfig;
use crate::ledger::LedgerConfig;
use crate::replication::ReplicationConfig;

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9898)),
        }
    }
}

/// Configuration for the optional external anchor.
#[derive(Clone, Debug)]
pub struct AnchorConfig {
    /// Endpoint receiving `{ "document_hash": ... }` posts.
    pub url: String,
    pub timeout: Duration,
}

/// Top-level configuration for a notary node.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Endpoint other nodes use to reach this one.
    pub endpoint: String,
    /// Node to register with and discover peers from at startup.
    pub bootstrap: Option<String>,
    pub ledger: LedgerConfig,
    pub replication: ReplicationConfig,
    pub admission: AdmissionConfig,
    pub metrics: MetricsConfig,
    pub anchor: Option<AnchorConfig>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".to_string(),
            bootstrap: None,
            ledger: LedgerConfig::default(),
            replication: ReplicationConfig::default(),
            admission: AdmissionConfig::default(),
            metrics: MetricsConfig::default(),
            anchor: None,
        }
    }
}

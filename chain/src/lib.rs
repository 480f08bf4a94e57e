//! Notary chain library crate.
//!
//! This crate provides the core of a peer-replicated document notary:
//! every node keeps a proof-of-work chain of document fingerprints and
//! admits new documents only after a majority of its peers agree.
//!
//! - strongly-typed domain types and wire messages (`types`),
//! - the ledger: chain, pending pool, proof-of-work and block acceptance
//!   (`ledger`),
//! - block storage backends (`storage`),
//! - peer membership and the peer client seam (`peers`),
//! - broadcast and chain synchronization (`replication`),
//! - fingerprinting, content policy and quorum admission (`admission`),
//! - an optional external anchor (`anchor`),
//! - Prometheus-based metrics (`metrics`),
//! - the node facade tying it all together (`node`),
//! - and a top-level node configuration (`config`).
//!
//! Transports (the HTTP binary in `node-api`) map routes onto [`Node`]
//! operations and [`ErrorClass`] onto status codes.

pub mod admission;
pub mod anchor;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod node;
pub mod peers;
pub mod replication;
pub mod storage;
pub mod types;

// Re-export top-level configuration types.
pub use config::{AnchorConfig, MetricsConfig, NodeConfig};

pub use error::{ErrorClass, NodeError};
pub use node::Node;

// Re-export the ledger and its seams.
pub use ledger::{
    BlockStore, BlockValidator, BlockVerdict, ForkChoice, IntegrityError, Ledger, LedgerConfig,
    LinkValidator, LongestChainForkChoice,
};
pub use storage::InMemoryBlockStore;

pub use admission::{AdmissionConfig, DEFAULT_MAX_DOCUMENT_BYTES, FingerprintScheme};
pub use anchor::{Anchor, HttpAnchor};
pub use peers::{HttpPeerClient, PeerClient, PeerError};
pub use replication::ReplicationConfig;

// Re-export metrics registry and exporter.
pub use metrics::{LedgerMetrics, MetricsRegistry, run_prometheus_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;

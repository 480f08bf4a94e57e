//! Node binary configuration.
//!
//! Every knob is a CLI flag with a `NOTARY_*` environment fallback. Flags
//! overlay `notary_chain::NodeConfig::default()`.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use notary_chain::{AnchorConfig, DEFAULT_MAX_DOCUMENT_BYTES, FingerprintScheme, NodeConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("similarity threshold must be in (0, 1], got {0}")]
    Threshold(f64),

    #[error("{name} must be at least 1")]
    Zero { name: &'static str },

    #[error("anchor URL is empty")]
    EmptyAnchorUrl,
}

/// Peer-replicated document notary node.
#[derive(Parser, Debug, Clone)]
#[command(name = "notary-node")]
#[command(about = "Document notary node: admits documents by peer vote and seals them into a proof-of-work chain")]
pub struct Args {
    /// Address the HTTP API binds to.
    #[arg(long, env = "NOTARY_LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// Endpoint other nodes use to reach this one. Defaults to
    /// `http://127.0.0.1:<listen port>`.
    #[arg(long, env = "NOTARY_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Node to register with and sync from at startup.
    #[arg(long, env = "NOTARY_BOOTSTRAP")]
    pub bootstrap: Option<String>,

    /// Similarity fingerprint: `minhash` or `simhash`.
    #[arg(long, env = "NOTARY_FINGERPRINT", default_value = "minhash")]
    pub fingerprint: FingerprintScheme,

    #[arg(long, env = "NOTARY_SIMILARITY_THRESHOLD", default_value_t = 0.65)]
    pub similarity_threshold: f64,

    /// Comma-separated keywords rejected by the content policy.
    #[arg(long, env = "NOTARY_BLACKLIST", value_delimiter = ',')]
    pub blacklist: Option<Vec<String>>,

    /// Largest accepted document in bytes. Request bodies may be about
    /// twice this, since votes carry the document hex-encoded.
    #[arg(long, env = "NOTARY_MAX_DOCUMENT_BYTES", default_value_t = DEFAULT_MAX_DOCUMENT_BYTES)]
    pub max_document_bytes: usize,

    #[arg(long, env = "NOTARY_POW_TIMEOUT_SECS", default_value_t = 30)]
    pub pow_timeout_secs: u64,

    /// Attempts per peer for every fan-out call.
    #[arg(long, env = "NOTARY_PEER_RETRIES", default_value_t = 3)]
    pub peer_retries: u32,

    #[arg(long, env = "NOTARY_PEER_TIMEOUT_SECS", default_value_t = 5)]
    pub peer_timeout_secs: u64,

    #[arg(long, env = "NOTARY_PEER_BACKOFF_MS", default_value_t = 2000)]
    pub peer_backoff_ms: u64,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "NOTARY_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Write-through anchor receiving every admitted document hash.
    #[arg(long, env = "NOTARY_ANCHOR_URL")]
    pub anchor_url: Option<String>,

    #[arg(long, env = "NOTARY_ANCHOR_TIMEOUT_SECS", default_value_t = 5)]
    pub anchor_timeout_secs: u64,
}

impl Args {
    pub fn into_node_config(self) -> Result<NodeConfig, ConfigError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ConfigError::Threshold(self.similarity_threshold));
        }
        if self.peer_retries == 0 {
            return Err(ConfigError::Zero {
                name: "peer retries",
            });
        }
        if self.max_document_bytes == 0 {
            return Err(ConfigError::Zero {
                name: "max document bytes",
            });
        }
        if self.pow_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                name: "proof-of-work timeout",
            });
        }

        let mut config = NodeConfig::default();
        config.endpoint = self
            .endpoint
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.listen.port()));
        config.bootstrap = self.bootstrap;

        config.ledger.pow_timeout = Duration::from_secs(self.pow_timeout_secs);

        config.replication.retries = self.peer_retries;
        config.replication.attempt_timeout = Duration::from_secs(self.peer_timeout_secs);
        config.replication.backoff = Duration::from_millis(self.peer_backoff_ms);

        config.admission.scheme = self.fingerprint;
        config.admission.similarity_threshold = self.similarity_threshold;
        config.admission.max_document_bytes = self.max_document_bytes;
        if let Some(blacklist) = self.blacklist {
            config.admission.blacklist = blacklist
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }

        config.metrics.enabled = self.metrics_addr.is_some();
        if let Some(addr) = self.metrics_addr {
            config.metrics.listen_addr = addr;
        }

        config.anchor = match self.anchor_url {
            Some(url) if url.trim().is_empty() => return Err(ConfigError::EmptyAnchorUrl),
            Some(url) => Some(AnchorConfig {
                url,
                timeout: Duration::from_secs(self.anchor_timeout_secs),
            }),
            None => None,
        };

        Ok(config)
    }
}

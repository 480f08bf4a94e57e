//! Concurrent fan-out to peers with bounded retries.
//!
//! One future per peer runs under `join_all`; each peer gets up to
//! `retries` attempts, each bounded by `attempt_timeout`, with a fixed
//! `backoff` in between. Failures are logged and reported, never raised.

use std::future::Future;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::peers::PeerError;

use super::config::ReplicationConfig;

/// Per-peer outcome of a [`broadcast`].
#[derive(Debug)]
pub struct BroadcastReport<T> {
    pub outcomes: Vec<(String, Result<T, PeerError>)>,
}

impl<T> BroadcastReport<T> {
    /// Peers that replied successfully, with their replies.
    pub fn delivered(&self) -> impl Iterator<Item = (&str, &T)> {
        self.outcomes
            .iter()
            .filter_map(|(peer, r)| r.as_ref().ok().map(|v| (peer.as_str(), v)))
    }

    /// Peers that never produced a successful reply.
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(peer, _)| peer.as_str())
            .collect()
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Sends `op` to every peer concurrently and collects the outcomes in peer
/// order.
pub async fn broadcast<T, F, Fut>(
    peers: &[String],
    config: &ReplicationConfig,
    op: F,
) -> BroadcastReport<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, PeerError>>,
{
    let op = &op;
    let outcomes = join_all(peers.iter().map(|peer| async move {
        let result = deliver(peer, config, op).await;
        (peer.clone(), result)
    }))
    .await;

    let report = BroadcastReport { outcomes };
    debug!(
        peers = peers.len(),
        delivered = report.delivered_count(),
        "broadcast finished"
    );
    report
}

async fn deliver<T, F, Fut>(peer: &str, config: &ReplicationConfig, op: &F) -> Result<T, PeerError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, PeerError>>,
{
    let attempts = config.retries.max(1);
    let mut last = PeerError::Timeout;
    for attempt in 1..=attempts {
        let err = match tokio::time::timeout(config.attempt_timeout, op(peer.to_string())).await {
            Ok(Ok(reply)) => return Ok(reply),
            Ok(Err(e)) => e,
            Err(_) => PeerError::Timeout,
        };
        warn!(peer = %peer, attempt, error = %err, "peer request failed");
        if !err.is_retryable() {
            return Err(err);
        }
        last = err;
        if attempt < attempts {
            tokio::time::sleep(config.backoff).await;
        }
    }
    Err(last)
}

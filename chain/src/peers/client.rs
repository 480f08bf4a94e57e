//! Transport seam between nodes.
//!
//! Every call addresses one peer by its canonical endpoint. The node is
//! generic over [`PeerClient`], so the same replication code runs over HTTP
//! in production and over in-process loopback in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    BlockProposal, ChainPayload, PeerList, PeerPayload, SyncOutcome, Transaction,
    VerifyTransactionRequest, VoteResponse,
};

/// Failure talking to a single peer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PeerError {
    /// Connection refused, reset, DNS failure and the like.
    #[error("transport error: {0}")]
    Transport(String),

    /// No reply within the per-attempt timeout.
    #[error("timed out")]
    Timeout,

    /// The peer answered, but with a non-success status.
    #[error("peer answered {status}: {message}")]
    Status { status: u16, message: String },

    /// The reply could not be decoded.
    #[error("malformed reply: {0}")]
    Protocol(String),
}

impl PeerError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PeerError::Transport(_) | PeerError::Timeout => true,
            PeerError::Status { status, .. } => *status >= 500,
            PeerError::Protocol(_) => false,
        }
    }
}

/// Client side of the replication protocol.
#[async_trait]
pub trait PeerClient: Send + Sync + 'static {
    /// Liveness probe (`health-check`).
    async fn health(&self, peer: &str) -> Result<(), PeerError>;

    /// The peer's known endpoints (`get-peers`).
    async fn get_peers(&self, peer: &str) -> Result<PeerList, PeerError>;

    /// The peer's full chain (`get-chain`).
    async fn get_chain(&self, peer: &str) -> Result<ChainPayload, PeerError>;

    /// Asks the peer to register `payload.node_url` (`register-peer`).
    async fn register(&self, peer: &str, payload: &PeerPayload) -> Result<PeerList, PeerError>;

    /// Tells the peer about a new endpoint without further gossip (`add-peer`).
    async fn add_peer(&self, peer: &str, payload: &PeerPayload) -> Result<(), PeerError>;

    /// Offers a chain to the peer (`sync`).
    async fn push_chain(&self, peer: &str, payload: &ChainPayload)
    -> Result<SyncOutcome, PeerError>;

    /// Offers a newly sealed block (`propose-block`).
    async fn propose_block(&self, peer: &str, proposal: &BlockProposal) -> Result<(), PeerError>;

    /// Gossips an accepted, unsealed transaction (`enqueue-transaction`).
    async fn enqueue_transaction(&self, peer: &str, tx: &Transaction) -> Result<(), PeerError>;

    /// Requests an independent admission verdict (`verify-transaction-vote`).
    async fn request_vote(
        &self,
        peer: &str,
        request: &VerifyTransactionRequest,
    ) -> Result<VoteResponse, PeerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retried() {
        assert!(PeerError::Transport("refused".into()).is_retryable());
        assert!(PeerError::Timeout.is_retryable());
        assert!(
            PeerError::Status {
                status: 503,
                message: "busy".into()
            }
            .is_retryable()
        );
        assert!(
            !PeerError::Status {
                status: 409,
                message: "stale".into()
            }
            .is_retryable()
        );
        assert!(!PeerError::Protocol("bad json".into()).is_retryable());
    }
}

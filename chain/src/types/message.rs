//! Tagged message schemas exchanged between nodes and with clients.
//!
//! Every replication operation has its own request/response struct so that
//! payloads are validated by serde at the boundary instead of being probed
//! field by field.

use serde::{Deserialize, Serialize};

use super::{Block, DocumentHash, Transaction};

/// A block offered by a peer for the acceptance state machine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockProposal {
    pub block: Block,
    /// Endpoint of the proposing node, used to resync on a link conflict.
    #[serde(default)]
    pub sender: Option<String>,
}

/// A full chain, as served by `get-chain` or pushed by `sync`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainPayload {
    pub chain: Vec<Block>,
    #[serde(default)]
    pub length: usize,
}

impl ChainPayload {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

/// Result of offering a chain to the local ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub replaced: bool,
    pub length: usize,
}

/// A single peer endpoint (`register-peer`, `add-peer`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerPayload {
    pub node_url: String,
}

/// Snapshot of known peers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PeerList {
    pub nodes: Vec<String>,
}

/// Request for an independent admission verdict from a peer.
///
/// The document travels hex-encoded so the peer can recompute the hash and
/// fingerprint itself rather than trusting the claimed values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyTransactionRequest {
    pub document_hash: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    pub content_hex: String,
}

/// A peer's verdict on a [`VerifyTransactionRequest`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub is_valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_hash: Option<String>,
}

impl VoteResponse {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: "verified".to_string(),
            similar_hash: None,
        }
    }

    pub fn invalid(message: impl Into<String>, similar_hash: Option<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            similar_hash,
        }
    }
}

/// Successful submit-document result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub document_hash: DocumentHash,
    /// Index of the block the transaction was (or will be) sealed into.
    pub block_index: u64,
    pub valid_votes: usize,
    pub total_votes: usize,
    /// `true` once the transaction has been sealed into a local block.
    pub sealed: bool,
}

/// Result of verify-document-exists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub document_hash: DocumentHash,
    pub is_verified: bool,
}

/// Liveness and a summary of local state (`health-check`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub endpoint: String,
    pub chain_length: usize,
    pub pending: usize,
    pub peers: usize,
}

/// Reply to a block proposal that was accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockAck {
    pub verdict: String,
    pub length: usize,
}

/// Result of the standalone mine trigger; `block` is `None` when there was
/// nothing to seal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MineOutcome {
    pub block: Option<Block>,
}

/// Reply to enqueue-transaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnqueueReceipt {
    /// `false` if the transaction was already sealed or pending.
    pub queued: bool,
    pub block_index: u64,
}

/// Accepts either a bare transaction or `{ "transaction": ... }` for
/// enqueue-transaction, so older peers that post the bare object still work.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TransactionEnvelope {
    Wrapped { transaction: Transaction },
    Bare(Transaction),
}

impl TransactionEnvelope {
    pub fn into_inner(self) -> Transaction {
        match self {
            TransactionEnvelope::Wrapped { transaction } => transaction,
            TransactionEnvelope::Bare(tx) => tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_proposal_sender_is_optional() {
        let json = serde_json::json!({
            "block": {
                "index": 1,
                "timestamp": 0.0,
                "transactions": [],
                "proof": 1,
                "previous_hash": "0"
            }
        });
        let proposal: BlockProposal = serde_json::from_value(json).expect("proposal parses");
        assert!(proposal.sender.is_none());
        assert!(proposal.block.is_genesis());
    }

    #[test]
    fn transaction_envelope_accepts_both_shapes() {
        let hash = "ef".repeat(32);
        let bare = serde_json::json!({ "document_hash": hash, "fingerprint": null });
        let wrapped = serde_json::json!({ "transaction": { "document_hash": hash } });

        let a: TransactionEnvelope = serde_json::from_value(bare).expect("bare");
        let b: TransactionEnvelope = serde_json::from_value(wrapped).expect("wrapped");
        assert_eq!(a.into_inner(), b.into_inner());
    }

    #[test]
    fn vote_response_omits_absent_similar_hash() {
        let text = serde_json::to_string(&VoteResponse::valid()).expect("serialize vote");
        assert!(!text.contains("similar_hash"));
    }
}

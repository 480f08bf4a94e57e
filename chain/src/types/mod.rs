//! Core domain types used by the chain
//!
//! This module defines the block and transaction shapes that travel between
//! nodes, the strongly-typed document hash, and the tagged message schemas
//! used by the replication protocol. The goal is to avoid passing loosely
//! typed JSON around and instead validate payloads at the boundary.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod block;
pub mod message;
pub mod tx;

pub use block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP};
pub use message::{
    BlockAck, BlockProposal, ChainPayload, DocumentStatus, EnqueueReceipt, HealthReport,
    MineOutcome, PeerList, PeerPayload, SubmitReceipt, SyncOutcome, TransactionEnvelope,
    VerifyTransactionRequest, VoteResponse,
};
pub use tx::Transaction;

/// Length in hex characters of a SHA-256 digest.
pub const HASH_HEX_LEN: usize = 64;

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Content hash of a raw document (`sha256(document_bytes)` as lowercase hex).
///
/// The wire representation is the bare hex string, so the newtype is
/// transparent to serde.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHash(pub String);

impl DocumentHash {
    /// Computes the document hash of the raw document bytes.
    pub fn compute(document_bytes: &[u8]) -> Self {
        DocumentHash(sha256_hex(document_bytes))
    }

    /// Parses a claimed hash received from a client or peer.
    ///
    /// Accepts exactly 64 hex characters; the result is lower-cased so that
    /// comparisons against locally computed hashes are byte-for-byte.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() != HASH_HEX_LEN || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(DocumentHash(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the current wall-clock time as fractional seconds since Unix epoch.
///
/// On error (system clock before epoch) this falls back to 0.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn document_hash_parse_normalizes_case_and_rejects_garbage() {
        let upper = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        let parsed = DocumentHash::parse(upper).expect("valid hex hash");
        assert_eq!(parsed, DocumentHash::compute(b"abc"));

        assert!(DocumentHash::parse("").is_none());
        assert!(DocumentHash::parse("abc").is_none());
        assert!(DocumentHash::parse(&"z".repeat(HASH_HEX_LEN)).is_none());
    }
}

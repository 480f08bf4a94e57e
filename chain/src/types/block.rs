// chain/src/types/block.rs

//! Block type and hashing.
//!
//! This module defines the block data structure exchanged between nodes,
//! the fixed genesis block, and a canonical hashing routine.
//!
//! Hashing goes through a dedicated canonical view that serializes the
//! block as JSON with a fixed (lexicographic) key order and hashes the
//! bytes with SHA-256. The same canonical encoding is used everywhere we
//! need a block hash; any two nodes hashing the same logical block must
//! agree or the chain links break.

use serde::{Deserialize, Serialize};

use super::{Transaction, sha256_hex};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// `proof` of the genesis block.
pub const GENESIS_PROOF: u64 = 1;

/// Genesis timestamp. Fixed so that every node derives the same genesis hash.
pub const GENESIS_TIMESTAMP: f64 = 0.0;

/// A sealed batch of transactions.
///
/// Field order here is the wire order: `index`, `timestamp`,
/// `transactions`, `proof`, `previous_hash`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, starting at 1 for genesis.
    pub index: u64,

    /// Wall-clock creation time in seconds since Unix epoch.
    ///
    /// Also used as the first-writer tie-break when two valid blocks
    /// compete for the same index.
    pub timestamp: f64,

    /// Ordered transactions sealed into this block.
    pub transactions: Vec<Transaction>,

    /// Proof-of-work answer relative to the parent's proof.
    pub proof: u64,

    /// Hex hash of the parent block (`"0"` for genesis).
    pub previous_hash: String,
}

/// Canonical hashing view: keys in lexicographic order.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    index: u64,
    previous_hash: &'a str,
    proof: u64,
    timestamp: f64,
    transactions: Vec<CanonicalTx<'a>>,
}

#[derive(Serialize)]
struct CanonicalTx<'a> {
    document_hash: &'a str,
    fingerprint: Option<&'a str>,
}

impl Block {
    /// The fixed first block of every chain.
    pub fn genesis() -> Self {
        Self {
            index: 1,
            timestamp: GENESIS_TIMESTAMP,
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    /// Returns `true` if this block is exactly the fixed genesis block.
    pub fn is_genesis(&self) -> bool {
        *self == Block::genesis()
    }

    /// Returns the canonical byte representation of this block.
    ///
    /// All hashing that depends on a "canonical" form should go through
    /// this method to avoid format drift.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails. This is considered a programming
    /// error, because the canonical view only holds plain fields.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let view = CanonicalBlock {
            index: self.index,
            previous_hash: &self.previous_hash,
            proof: self.proof,
            timestamp: self.timestamp,
            transactions: self
                .transactions
                .iter()
                .map(|tx| CanonicalTx {
                    document_hash: tx.document_hash.as_str(),
                    fingerprint: tx.fingerprint.as_deref(),
                })
                .collect(),
        };
        serde_json::to_vec(&view).expect("canonical block view should always serialize")
    }

    /// Computes the canonical SHA-256 hash of this block as lowercase hex.
    pub fn compute_hash(&self) -> String {
        sha256_hex(&self.canonical_bytes())
    }

    /// Iterates over the document hashes sealed into this block.
    pub fn document_hashes(&self) -> impl Iterator<Item = &str> {
        self.transactions.iter().map(|tx| tx.document_hash.as_str())
    }
}

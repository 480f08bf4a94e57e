use thiserror::Error;

/// Reason a block (or a whole chain) failed the link/proof/index checks.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// `previous_hash` does not match the hash of the expected parent.
    #[error("previous_hash mismatch at index {index}")]
    PrevHash { index: u64 },

    /// Proof-of-work answer does not satisfy the difficulty prefix.
    #[error("invalid proof at index {index}")]
    Proof { index: u64 },

    /// Index does not follow its parent.
    #[error("index mismatch: expected {expected}, got {got}")]
    Index { expected: u64, got: u64 },

    /// An existing block at this index has an earlier or equal timestamp.
    #[error("block at index {index} already exists with an earlier or equal timestamp")]
    Stale { index: u64 },

    /// Chain has no blocks at all.
    #[error("chain is empty")]
    Empty,

    /// First block does not have the genesis shape.
    #[error("chain does not start with the genesis block")]
    Genesis,
}

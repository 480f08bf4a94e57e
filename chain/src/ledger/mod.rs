//! Ledger: chain storage, proof-of-work, validation and block acceptance.
//!
//! This module provides:
//!
//! - the [`Ledger`] itself (chain + pending pool),
//! - the proof-of-work puzzle ([`pow`]),
//! - the [`acceptance`] state machine for peer blocks,
//! - and the seams the ledger is generic over ([`BlockStore`],
//!   [`BlockValidator`], [`ForkChoice`]).

pub mod acceptance;
pub mod config;
pub mod engine;
pub mod error;
pub mod fork_choice;
pub mod pow;
pub mod store;
pub mod validator;

pub use acceptance::BlockVerdict;
pub use config::LedgerConfig;
pub use engine::{Ledger, MiningTarget};
pub use error::IntegrityError;
pub use fork_choice::{ForkChoice, LongestChainForkChoice};
pub use pow::{DIFFICULTY_PREFIX, is_valid_proof, proof_of_work, proof_of_work_cancellable};
pub use store::BlockStore;
pub use validator::{BlockValidator, LinkValidator, validate_chain};

use crate::types::Block;

/// Canonical hex hash of a block.
pub fn hash_block(block: &Block) -> String {
    block.compute_hash()
}

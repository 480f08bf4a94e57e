//! Proof-of-work puzzle.
//!
//! A proof `p` is valid against the parent's proof `q` when
//! `sha256(decimal(p² − q²))` starts with [`DIFFICULTY_PREFIX`]. The
//! difference is taken over unbounded integers, so a negative difference
//! is rendered with a leading `-`. Verification is one hash; finding a
//! proof is a linear search from 1.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::sha256_hex;

/// Required hex prefix of the puzzle digest.
pub const DIFFICULTY_PREFIX: &str = "0000";

/// How many candidates are tried between two looks at the cancel flag.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

fn puzzle_input(proof: u64, previous_proof: u64) -> String {
    // Squares of u64 always fit in u128.
    let p = u128::from(proof) * u128::from(proof);
    let q = u128::from(previous_proof) * u128::from(previous_proof);
    if p >= q {
        (p - q).to_string()
    } else {
        format!("-{}", q - p)
    }
}

/// Checks a proof against the parent's proof.
pub fn is_valid_proof(proof: u64, previous_proof: u64) -> bool {
    sha256_hex(puzzle_input(proof, previous_proof).as_bytes()).starts_with(DIFFICULTY_PREFIX)
}

/// Finds the smallest positive proof for `previous_proof`.
///
/// Unbounded: callers on a request path should use
/// [`proof_of_work_cancellable`] instead.
pub fn proof_of_work(previous_proof: u64) -> u64 {
    let mut proof = 1;
    while !is_valid_proof(proof, previous_proof) {
        proof += 1;
    }
    proof
}

/// Same search as [`proof_of_work`], abandoned once `cancel` is set.
///
/// Returns `None` if the search was cancelled before a proof was found.
pub fn proof_of_work_cancellable(previous_proof: u64, cancel: &AtomicBool) -> Option<u64> {
    let mut proof: u64 = 1;
    loop {
        if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return None;
        }
        if is_valid_proof(proof, previous_proof) {
            return Some(proof);
        }
        proof = proof.checked_add(1)?;
    }
}

//! Block-acceptance state machine for proposals received from peers.
//!
//! A proposal may extend the tip, or compete with the tip as a sibling
//! (same parent, same index). Anything else is a link conflict that the
//! caller resolves by resyncing with the sender before re-evaluating.

use crate::types::Block;

use super::error::IntegrityError;
use super::fork_choice::ForkChoice;
use super::validator::BlockValidator;

/// Outcome of evaluating one proposal against the local chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockVerdict {
    /// Links to neither the tip nor the tip's parent.
    RejectPrevHash,
    /// Proof does not solve the puzzle for the parent's proof.
    RejectProof,
    /// Index does not follow the parent.
    RejectIndex,
    /// A block with an earlier or equal timestamp already holds the index.
    RejectStale,
    /// Extends the tip.
    AcceptAppend,
    /// Displaces the tip, which it beats on timestamp.
    AcceptReplace,
}

impl BlockVerdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, BlockVerdict::AcceptAppend | BlockVerdict::AcceptReplace)
    }

    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            BlockVerdict::RejectPrevHash => "reject_prev_hash",
            BlockVerdict::RejectProof => "reject_proof",
            BlockVerdict::RejectIndex => "reject_index",
            BlockVerdict::RejectStale => "reject_stale",
            BlockVerdict::AcceptAppend => "accept_append",
            BlockVerdict::AcceptReplace => "accept_replace",
        }
    }

    /// Turns a rejection of `block` against `chain` into the matching
    /// [`IntegrityError`].
    pub fn into_result(self, chain: &[Block], block: &Block) -> Result<Self, IntegrityError> {
        let index = block.index;
        match self {
            BlockVerdict::RejectPrevHash => Err(IntegrityError::PrevHash { index }),
            BlockVerdict::RejectProof => Err(IntegrityError::Proof { index }),
            BlockVerdict::RejectIndex => Err(IntegrityError::Index {
                expected: find_parent(chain, block).map_or(chain.len() as u64 + 1, |p| p.index + 1),
                got: index,
            }),
            BlockVerdict::RejectStale => Err(IntegrityError::Stale { index }),
            accepted => Ok(accepted),
        }
    }
}

/// Evaluates `block` against `chain` without mutating anything.
pub fn evaluate<V, F>(chain: &[Block], validator: &V, fork_choice: &F, block: &Block) -> BlockVerdict
where
    V: BlockValidator,
    F: ForkChoice,
{
    let Some(parent) = find_parent(chain, block) else {
        return BlockVerdict::RejectPrevHash;
    };

    match validator.validate(parent, block) {
        Ok(()) => {}
        Err(IntegrityError::Proof { .. }) => return BlockVerdict::RejectProof,
        Err(IntegrityError::Index { .. }) => return BlockVerdict::RejectIndex,
        Err(_) => return BlockVerdict::RejectPrevHash,
    }

    let existing = block
        .index
        .checked_sub(1)
        .and_then(|p| usize::try_from(p).ok())
        .and_then(|p| chain.get(p));
    match existing {
        Some(existing) if fork_choice.should_replace_block(existing, block) => {
            BlockVerdict::AcceptReplace
        }
        Some(_) => BlockVerdict::RejectStale,
        None => BlockVerdict::AcceptAppend,
    }
}

/// The tip, or the tip's parent for a competing sibling.
fn find_parent<'a>(chain: &'a [Block], block: &Block) -> Option<&'a Block> {
    let mut candidates = chain.iter().rev().take(2);
    candidates.find(|parent| parent.compute_hash() == block.previous_hash)
}

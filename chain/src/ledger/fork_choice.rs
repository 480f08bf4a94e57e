//! Conflict resolution between competing blocks and chains.

use crate::types::Block;

use super::validator::{BlockValidator, LinkValidator, validate_chain};

/// Abstraction over fork-choice rules.
pub trait ForkChoice {
    /// Returns `true` if `candidate` should displace `existing` at the same
    /// index.
    fn should_replace_block(&self, existing: &Block, candidate: &Block) -> bool;

    /// Returns `true` if the local chain should be swapped for `remote`.
    fn should_adopt_chain(&self, local: &[Block], remote: &[Block]) -> bool;
}

/// Longest valid chain wins wholesale; per index, the strictly earlier
/// timestamp wins. Equal timestamps keep the existing block.
#[derive(Clone, Copy, Debug, Default)]
pub struct LongestChainForkChoice<V = LinkValidator> {
    validator: V,
}

impl<V: BlockValidator> LongestChainForkChoice<V> {
    pub fn new(validator: V) -> Self {
        Self { validator }
    }
}

impl<V: BlockValidator> ForkChoice for LongestChainForkChoice<V> {
    fn should_replace_block(&self, existing: &Block, candidate: &Block) -> bool {
        candidate.timestamp < existing.timestamp
    }

    fn should_adopt_chain(&self, local: &[Block], remote: &[Block]) -> bool {
        remote.len() > local.len() && validate_chain(&self.validator, remote).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pow::proof_of_work;

    fn extend(chain: &mut Vec<Block>, timestamp: f64) {
        let parent = chain.last().expect("non-empty chain").clone();
        chain.push(Block {
            index: parent.index + 1,
            timestamp,
            transactions: Vec::new(),
            proof: proof_of_work(parent.proof),
            previous_hash: parent.compute_hash(),
        });
    }

    #[test]
    fn earlier_timestamp_wins_ties_keep_existing() {
        let rule = LongestChainForkChoice::<LinkValidator>::default();
        let mut chain = vec![Block::genesis()];
        extend(&mut chain, 50.0);
        let existing = chain[1].clone();

        let mut earlier = existing.clone();
        earlier.timestamp = 49.0;
        let same = existing.clone();

        assert!(rule.should_replace_block(&existing, &earlier));
        assert!(!rule.should_replace_block(&existing, &same));
        assert!(!rule.should_replace_block(&earlier, &existing));
    }

    #[test]
    fn adopts_only_strictly_longer_valid_chains() {
        let rule = LongestChainForkChoice::new(LinkValidator);
        let local = vec![Block::genesis()];

        let mut remote = local.clone();
        extend(&mut remote, 10.0);
        assert!(rule.should_adopt_chain(&local, &remote));
        assert!(!rule.should_adopt_chain(&remote, &remote));
        assert!(!rule.should_adopt_chain(&remote, &local));

        let mut broken = remote.clone();
        broken[1].previous_hash = "ff".repeat(32);
        extend(&mut broken, 20.0);
        assert!(!rule.should_adopt_chain(&local, &broken));
    }
}

//! Block validity predicates.

use crate::types::Block;

use super::error::IntegrityError;
use super::pow::is_valid_proof;

/// Pluggable validity predicate for a block relative to its parent.
///
/// Implementations should be deterministic and side-effect free.
pub trait BlockValidator {
    fn validate(&self, parent: &Block, block: &Block) -> Result<(), IntegrityError>;
}

/// Link, proof and index checks, in that order.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkValidator;

impl BlockValidator for LinkValidator {
    fn validate(&self, parent: &Block, block: &Block) -> Result<(), IntegrityError> {
        if block.previous_hash != parent.compute_hash() {
            return Err(IntegrityError::PrevHash { index: block.index });
        }
        if !is_valid_proof(block.proof, parent.proof) {
            return Err(IntegrityError::Proof { index: block.index });
        }
        let expected = parent.index + 1;
        if block.index != expected {
            return Err(IntegrityError::Index {
                expected,
                got: block.index,
            });
        }
        Ok(())
    }
}

/// Validates a whole chain: non-empty, fixed genesis first, and every
/// adjacent pair passing `validator`.
pub fn validate_chain<V: BlockValidator>(validator: &V, chain: &[Block]) -> Result<(), IntegrityError> {
    let first = chain.first().ok_or(IntegrityError::Empty)?;
    if !first.is_genesis() {
        return Err(IntegrityError::Genesis);
    }
    chain
        .windows(2)
        .try_for_each(|pair| validator.validate(&pair[0], &pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pow::proof_of_work;

    fn child_of(parent: &Block) -> Block {
        Block {
            index: parent.index + 1,
            timestamp: 100.0,
            transactions: Vec::new(),
            proof: proof_of_work(parent.proof),
            previous_hash: parent.compute_hash(),
        }
    }

    #[test]
    fn accepts_well_formed_child() {
        let genesis = Block::genesis();
        let child = child_of(&genesis);
        assert_eq!(LinkValidator.validate(&genesis, &child), Ok(()));
        assert_eq!(validate_chain(&LinkValidator, &[genesis, child]), Ok(()));
    }

    #[test]
    fn reports_first_failing_check() {
        let genesis = Block::genesis();
        let good = child_of(&genesis);

        let mut bad_link = good.clone();
        bad_link.previous_hash = "00".repeat(32);
        assert_eq!(
            LinkValidator.validate(&genesis, &bad_link),
            Err(IntegrityError::PrevHash { index: 2 })
        );

        let mut bad_proof = good.clone();
        bad_proof.proof = (1..).find(|p| !is_valid_proof(*p, genesis.proof)).expect("invalid proof");
        assert_eq!(
            LinkValidator.validate(&genesis, &bad_proof),
            Err(IntegrityError::Proof { index: 2 })
        );

        let mut bad_index = good;
        bad_index.index = 5;
        assert_eq!(
            LinkValidator.validate(&genesis, &bad_index),
            Err(IntegrityError::Index { expected: 2, got: 5 })
        );
    }

    #[test]
    fn chain_must_start_with_fixed_genesis() {
        assert_eq!(validate_chain(&LinkValidator, &[]), Err(IntegrityError::Empty));

        let mut fake = Block::genesis();
        fake.timestamp = 42.0;
        assert_eq!(validate_chain(&LinkValidator, &[fake]), Err(IntegrityError::Genesis));

        assert_eq!(validate_chain(&LinkValidator, &[Block::genesis()]), Ok(()));
    }

    #[test]
    fn tampered_middle_block_breaks_the_next_link() {
        let genesis = Block::genesis();
        let second = child_of(&genesis);
        let third = child_of(&second);

        let mut tampered = second.clone();
        tampered.timestamp += 1.0;

        let chain = vec![genesis, tampered, third];
        assert_eq!(
            validate_chain(&LinkValidator, &chain),
            Err(IntegrityError::PrevHash { index: 3 })
        );
    }
}

//! In-memory block store.
//!
//! Blocks live in a `Vec` in chain order, so a block's position is always
//! `index - 1`. Nothing survives a restart; a node rebuilds its chain from
//! peers when it joins.

use crate::ledger::store::BlockStore;
use crate::types::Block;

/// In-memory implementation of [`BlockStore`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryBlockStore {
    blocks: Vec<Block>,
}

impl InMemoryBlockStore {
    /// Creates a new, empty in-memory block store.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(index: u64) -> Option<usize> {
        index.checked_sub(1).and_then(|p| usize::try_from(p).ok())
    }
}

impl BlockStore for InMemoryBlockStore {
    fn len(&self) -> usize {
        self.blocks.len()
    }

    fn get(&self, index: u64) -> Option<&Block> {
        Self::position(index).and_then(|p| self.blocks.get(p))
    }

    fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    fn replace_at(&mut self, block: Block) -> Option<Block> {
        let slot = Self::position(block.index).and_then(|p| self.blocks.get_mut(p))?;
        Some(std::mem::replace(slot, block))
    }

    fn replace_all(&mut self, chain: Vec<Block>) -> Vec<Block> {
        std::mem::replace(&mut self.blocks, chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_at(index: u64, timestamp: f64) -> Block {
        Block {
            index,
            timestamp,
            transactions: Vec::new(),
            proof: 7,
            previous_hash: "ab".repeat(32),
        }
    }

    #[test]
    fn push_and_get_by_chain_index() {
        let mut store = InMemoryBlockStore::new();
        assert!(store.is_empty());
        assert!(store.tip().is_none());

        store.push(Block::genesis());
        store.push(block_at(2, 10.0));

        assert_eq!(store.len(), 2);
        assert!(store.get(0).is_none());
        assert!(store.get(1).expect("genesis").is_genesis());
        assert_eq!(store.get(2).expect("second block").timestamp, 10.0);
        assert!(store.get(3).is_none());
        assert_eq!(store.tip().expect("tip").index, 2);
    }

    #[test]
    fn replace_at_returns_displaced_block() {
        let mut store = InMemoryBlockStore::new();
        store.push(Block::genesis());
        store.push(block_at(2, 10.0));

        let displaced = store.replace_at(block_at(2, 5.0)).expect("slot exists");
        assert_eq!(displaced.timestamp, 10.0);
        assert_eq!(store.get(2).expect("replaced").timestamp, 5.0);

        assert!(store.replace_at(block_at(9, 1.0)).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn replace_all_swaps_whole_chain() {
        let mut store = InMemoryBlockStore::new();
        store.push(Block::genesis());

        let old = store.replace_all(vec![Block::genesis(), block_at(2, 1.0), block_at(3, 2.0)]);
        assert_eq!(old.len(), 1);
        assert_eq!(store.len(), 3);
        assert_eq!(store.blocks()[2].index, 3);
    }
}

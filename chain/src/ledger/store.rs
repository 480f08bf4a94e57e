//! Storage abstraction used by the ledger.

use crate::types::Block;

/// Ordered block storage.
///
/// Blocks are addressed by their 1-based chain index. The ledger owns the
/// only handle to a store and performs every check before calling a
/// mutating method, so implementations do not validate anything.
pub trait BlockStore {
    /// Number of blocks, genesis included.
    fn len(&self) -> usize;

    /// Returns `true` if no blocks are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block at chain index `index` (1 is genesis).
    fn get(&self, index: u64) -> Option<&Block>;

    /// Last block of the chain, if any.
    fn tip(&self) -> Option<&Block>;

    /// All blocks in chain order.
    fn blocks(&self) -> &[Block];

    /// Appends a block after the current tip.
    fn push(&mut self, block: Block);

    /// Swaps the block at `block.index` and returns the one it displaced.
    fn replace_at(&mut self, block: Block) -> Option<Block>;

    /// Replaces the whole chain and returns the previous one.
    fn replace_all(&mut self, chain: Vec<Block>) -> Vec<Block>;
}

//! The ledger: a chain of blocks plus the pool of accepted, unsealed
//! transactions.
//!
//! The ledger wires together:
//!
//! - a [`BlockStore`] holding the chain,
//! - a [`BlockValidator`] for link/proof/index checks, and
//! - a [`ForkChoice`] rule for sibling conflicts and wholesale sync.
//!
//! It performs no I/O and never mines; callers compute proofs outside any
//! lock and hand them back through [`Ledger::seal`].

use std::collections::HashSet;

use tracing::{debug, info};

use crate::storage::InMemoryBlockStore;
use crate::types::{Block, DocumentHash, Transaction, unix_timestamp};

use super::acceptance::{self, BlockVerdict};
use super::error::IntegrityError;
use super::fork_choice::{ForkChoice, LongestChainForkChoice};
use super::store::BlockStore;
use super::validator::{BlockValidator, LinkValidator, validate_chain};

/// Snapshot of the tip a proof-of-work search is started against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiningTarget {
    /// Index the sealed block will get.
    pub index: u64,
    pub previous_proof: u64,
    pub previous_hash: String,
}

/// Chain plus pending pool.
///
/// Generic over:
///
/// - `S`: storage backend implementing [`BlockStore`],
/// - `V`: block validator implementing [`BlockValidator`],
/// - `F`: fork-choice rule implementing [`ForkChoice`].
#[derive(Debug)]
pub struct Ledger<S = InMemoryBlockStore, V = LinkValidator, F = LongestChainForkChoice> {
    store: S,
    validator: V,
    fork_choice: F,
    pending: Vec<Transaction>,
}

impl Ledger {
    /// A fresh in-memory ledger holding only the genesis block.
    pub fn in_memory() -> Self {
        Self::new(
            InMemoryBlockStore::new(),
            LinkValidator,
            LongestChainForkChoice::default(),
        )
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<S, V, F> Ledger<S, V, F>
where
    S: BlockStore,
    V: BlockValidator,
    F: ForkChoice,
{
    /// Creates a ledger over `store`, seeding the genesis block if the
    /// store is empty.
    pub fn new(mut store: S, validator: V, fork_choice: F) -> Self {
        if store.is_empty() {
            store.push(Block::genesis());
        }
        Self {
            store,
            validator,
            fork_choice,
            pending: Vec::new(),
        }
    }

    /// Blocks in chain order, genesis first.
    pub fn chain(&self) -> &[Block] {
        self.store.blocks()
    }

    /// Chain length, genesis included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Always `false`; a ledger holds at least the genesis block.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Last block of the chain.
    ///
    /// # Panics
    ///
    /// Panics if the store is empty, which the constructor and every
    /// mutation rule out.
    pub fn last_block(&self) -> &Block {
        self.store
            .tip()
            .expect("ledger always holds at least the genesis block")
    }

    /// Accepted transactions not yet sealed into a block.
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// Queues a transaction and returns the index of the block expected to
    /// seal it. No duplicate check happens here.
    pub fn add_transaction(&mut self, tx: Transaction) -> u64 {
        debug!(document_hash = %tx.document_hash, "transaction queued");
        self.pending.push(tx);
        self.next_index()
    }

    /// Seals every pending transaction into a new block on top of the tip.
    pub fn create_block(&mut self, proof: u64, previous_hash: String) -> Block {
        self.create_block_at(proof, previous_hash, unix_timestamp())
    }

    /// [`Ledger::create_block`] with an explicit timestamp.
    pub fn create_block_at(&mut self, proof: u64, previous_hash: String, timestamp: f64) -> Block {
        let block = Block {
            index: self.next_index(),
            timestamp,
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        self.store.push(block.clone());
        info!(
            index = block.index,
            txs = block.transactions.len(),
            "block sealed"
        );
        block
    }

    /// Tip snapshot to mine against.
    pub fn mining_target(&self) -> MiningTarget {
        let tip = self.last_block();
        MiningTarget {
            index: tip.index + 1,
            previous_proof: tip.proof,
            previous_hash: super::hash_block(tip),
        }
    }

    /// Seals the pending pool with a proof found for `target`, unless the
    /// tip moved in the meantime.
    pub fn seal(&mut self, target: &MiningTarget, proof: u64) -> Option<Block> {
        if self.mining_target() != *target {
            debug!(index = target.index, "tip moved while mining");
            return None;
        }
        Some(self.create_block(proof, target.previous_hash.clone()))
    }

    /// Full chain check: fixed genesis, then every link, proof and index.
    pub fn validate_chain(&self, chain: &[Block]) -> Result<(), IntegrityError> {
        validate_chain(&self.validator, chain)
    }

    pub fn is_chain_valid(&self, chain: &[Block]) -> bool {
        self.validate_chain(chain).is_ok()
    }

    /// Returns `true` if a sealed block carries `document_hash`.
    pub fn verify_document(&self, document_hash: &str) -> bool {
        self.chain()
            .iter()
            .flat_map(Block::document_hashes)
            .any(|h| h == document_hash)
    }

    /// Index of the first block sealing `document_hash`.
    pub fn locate_document(&self, document_hash: &str) -> Option<u64> {
        self.chain()
            .iter()
            .find(|b| b.document_hashes().any(|h| h == document_hash))
            .map(|b| b.index)
    }

    /// Returns `true` if the document is sealed or waiting in the pool.
    pub fn knows_document(&self, document_hash: &str) -> bool {
        self.verify_document(document_hash)
            || self
                .pending
                .iter()
                .any(|tx| tx.document_hash.as_str() == document_hash)
    }

    /// Fingerprinted transactions, sealed ones first in chain order, then
    /// the pending pool.
    pub fn fingerprints(&self) -> impl Iterator<Item = (&DocumentHash, &str)> {
        self.chain()
            .iter()
            .flat_map(|b| b.transactions.iter())
            .chain(self.pending.iter())
            .filter_map(|tx| Some((&tx.document_hash, tx.fingerprint.as_deref()?)))
    }

    /// Runs the acceptance state machine without mutating anything.
    pub fn evaluate_block(&self, block: &Block) -> BlockVerdict {
        acceptance::evaluate(self.chain(), &self.validator, &self.fork_choice, block)
    }

    /// Evaluates a peer's block and applies it when accepted.
    pub fn accept_block(&mut self, block: Block) -> Result<BlockVerdict, IntegrityError> {
        let verdict = self.evaluate_block(&block);
        let verdict = verdict.into_result(self.chain(), &block)?;
        let index = block.index;
        match verdict {
            BlockVerdict::AcceptAppend => self.store.push(block),
            BlockVerdict::AcceptReplace => {
                if let Some(displaced) = self.store.replace_at(block) {
                    self.requeue(displaced.transactions);
                }
            }
            _ => {}
        }
        self.prune_pending();
        info!(index, verdict = verdict.as_str(), "peer block applied");
        Ok(verdict)
    }

    /// Swaps in `remote` if the fork-choice rule prefers it.
    ///
    /// Transactions sealed only on the discarded chain go back to the
    /// pending pool. Returns `true` if the chain was replaced.
    pub fn adopt_chain(&mut self, remote: Vec<Block>) -> bool {
        if !self.fork_choice.should_adopt_chain(self.chain(), &remote) {
            return false;
        }
        let new_len = remote.len();
        let old = self.store.replace_all(remote);
        let orphaned = old.into_iter().flat_map(|b| b.transactions).collect();
        self.requeue(orphaned);
        self.prune_pending();
        info!(length = new_len, "chain replaced");
        true
    }

    fn next_index(&self) -> u64 {
        self.last_block().index + 1
    }

    fn requeue(&mut self, txs: Vec<Transaction>) {
        for tx in txs {
            if !self.knows_document(tx.document_hash.as_str()) {
                self.pending.push(tx);
            }
        }
    }

    fn prune_pending(&mut self) {
        let sealed: HashSet<String> = self
            .chain()
            .iter()
            .flat_map(Block::document_hashes)
            .map(str::to_owned)
            .collect();
        self.pending
            .retain(|tx| !sealed.contains(tx.document_hash.as_str()));
    }
}

//! Storage backends for the ledger.
//!
//! Only an in-memory store ([`mem::InMemoryBlockStore`]) is provided; the
//! ledger reaches it through the [`crate::ledger::store::BlockStore`] trait.

pub mod mem;

pub use mem::InMemoryBlockStore;

//! Replication protocol: fan-out to peers and chain synchronization.

pub mod broadcast;
pub mod config;
pub mod sync;

pub use broadcast::{BroadcastReport, broadcast};
pub use config::ReplicationConfig;
pub use sync::{replace_chain, resync_on_conflict, sync_chain};

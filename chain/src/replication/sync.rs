//! Chain synchronization between nodes.
//!
//! The ledger lock is only held for the in-memory swap; every network call
//! happens before it is taken.

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::ledger::Ledger;
use crate::peers::{PeerClient, PeerError};
use crate::types::Block;

use super::config::ReplicationConfig;

/// Adopts `remote` if it is longer than the local chain and valid.
pub async fn sync_chain(ledger: &RwLock<Ledger>, remote: Vec<Block>) -> bool {
    ledger.write().await.adopt_chain(remote)
}

async fn fetch_chain<C: PeerClient + ?Sized>(
    client: &C,
    peer: &str,
    config: &ReplicationConfig,
) -> Result<Vec<Block>, PeerError> {
    match tokio::time::timeout(config.attempt_timeout, client.get_chain(peer)).await {
        Ok(reply) => reply.map(|payload| payload.chain),
        Err(_) => Err(PeerError::Timeout),
    }
}

/// Pulls `sender`'s chain and offers it to the local ledger.
pub async fn resync_on_conflict<C: PeerClient + ?Sized>(
    client: &C,
    ledger: &RwLock<Ledger>,
    sender: &str,
    config: &ReplicationConfig,
) -> bool {
    match fetch_chain(client, sender, config).await {
        Ok(chain) => {
            let replaced = sync_chain(ledger, chain).await;
            debug!(peer = %sender, replaced, "resync after link conflict");
            replaced
        }
        Err(e) => {
            warn!(peer = %sender, error = %e, "resync failed");
            false
        }
    }
}

/// Tries `candidates` in order and adopts the first chain that is longer
/// than the local one, not genesis-only, and valid.
pub async fn replace_chain<C: PeerClient + ?Sized>(
    client: &C,
    ledger: &RwLock<Ledger>,
    candidates: &[String],
    config: &ReplicationConfig,
) -> bool {
    for peer in candidates {
        let chain = match fetch_chain(client, peer, config).await {
            Ok(chain) => chain,
            Err(e) => {
                warn!(peer = %peer, error = %e, "could not fetch chain");
                continue;
            }
        };
        if chain.len() <= 1 {
            continue;
        }
        if chain.len() <= ledger.read().await.len() {
            continue;
        }
        let length = chain.len();
        if sync_chain(ledger, chain).await {
            info!(peer = %peer, length, "chain replaced from peer");
            return true;
        }
    }
    false
}

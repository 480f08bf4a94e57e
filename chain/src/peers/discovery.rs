//! Membership helpers that need the network: peer-list discovery and
//! liveness probing.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::NodeError;

use super::client::PeerClient;
use super::registry::{PeerRegistry, normalize_endpoint};

/// Fetches `bootstrap`'s peer list once and unions it (and `bootstrap`
/// itself) into `registry`. Returns how many endpoints were new.
pub async fn discover<C: PeerClient + ?Sized>(
    client: &C,
    registry: &PeerRegistry,
    bootstrap: &str,
) -> Result<usize, NodeError> {
    let bootstrap = normalize_endpoint(bootstrap)?;
    let list = client
        .get_peers(&bootstrap)
        .await
        .map_err(|e| NodeError::PeerUnreachable {
            endpoint: bootstrap.clone(),
            reason: e.to_string(),
        })?;
    let added = registry.extend(list.nodes.iter().chain(std::iter::once(&bootstrap)));
    debug!(peer = %bootstrap, added, "peer list discovered");
    Ok(added)
}

/// Probes `endpoint`'s health route up to `retries` times, sleeping `delay`
/// between attempts.
pub async fn probe_liveness<C: PeerClient + ?Sized>(
    client: &C,
    endpoint: &str,
    retries: u32,
    delay: Duration,
) -> bool {
    let attempts = retries.max(1);
    for attempt in 1..=attempts {
        match client.health(endpoint).await {
            Ok(()) => return true,
            Err(e) => {
                debug!(peer = %endpoint, attempt, error = %e, "liveness probe failed");
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    warn!(peer = %endpoint, attempts, "peer not live");
    false
}

use std::time::Duration;

/// Retry and timeout policy for peer fan-out.
#[derive(Clone, Debug)]
pub struct ReplicationConfig {
    /// Attempts per peer before it is counted as failed.
    pub retries: u32,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
    /// Fixed sleep between two attempts to the same peer.
    pub backoff: Duration,
    /// Attempts of a liveness probe before a peer is declared not ready.
    pub liveness_retries: u32,
    /// Fixed sleep between two liveness probes.
    pub liveness_delay: Duration,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            attempt_timeout: Duration::from_secs(5),
            backoff: Duration::from_secs(2),
            liveness_retries: 5,
            liveness_delay: Duration::from_secs(2),
        }
    }
}

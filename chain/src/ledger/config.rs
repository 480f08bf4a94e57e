use std::time::Duration;

/// Ledger-level knobs for sealing new blocks.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Upper bound on a single proof-of-work search before it is abandoned.
    pub pow_timeout: Duration,
    /// How many times sealing is retried when the tip moves while mining.
    pub max_seal_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            pow_timeout: Duration::from_secs(30),
            max_seal_attempts: 3,
        }
    }
}

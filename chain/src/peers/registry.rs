//! Known peer endpoints.
//!
//! The set only grows. It always contains this node's own endpoint so that
//! a peer list handed to a newcomer includes the node that served it.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use tracing::info;

use crate::error::NodeError;

/// Canonicalizes a peer endpoint: trims whitespace, defaults the scheme to
/// `http://` and strips trailing slashes.
pub fn normalize_endpoint(raw: &str) -> Result<String, NodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NodeError::Validation("peer endpoint is empty".to_string()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let canonical = with_scheme.trim_end_matches('/');
    let host = canonical.split_once("://").map_or("", |(_, rest)| rest);
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(NodeError::Validation(format!(
            "invalid peer endpoint: {trimmed:?}"
        )));
    }
    Ok(canonical.to_string())
}

#[derive(Debug)]
pub struct PeerRegistry {
    self_endpoint: String,
    peers: RwLock<BTreeSet<String>>,
}

impl PeerRegistry {
    /// Creates a registry that knows only `self_endpoint`.
    pub fn new(self_endpoint: &str) -> Result<Self, NodeError> {
        let self_endpoint = normalize_endpoint(self_endpoint)?;
        let peers = RwLock::new(BTreeSet::from([self_endpoint.clone()]));
        Ok(Self {
            self_endpoint,
            peers,
        })
    }

    /// This node's canonical endpoint.
    pub fn self_endpoint(&self) -> &str {
        &self.self_endpoint
    }

    /// Adds an endpoint and returns its canonical form. Idempotent.
    pub fn register(&self, endpoint: &str) -> Result<String, NodeError> {
        let canonical = normalize_endpoint(endpoint)?;
        let inserted = self
            .peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(canonical.clone());
        if inserted {
            info!(peer = %canonical, "peer registered");
        }
        Ok(canonical)
    }

    /// Registers every valid endpoint in `endpoints`, skipping bad ones.
    /// Returns how many were new.
    pub fn extend<I, T>(&self, endpoints: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let before = self.len();
        for endpoint in endpoints {
            let _ = self.register(endpoint.as_ref());
        }
        self.len() - before
    }

    /// Returns `true` if the canonical form of `endpoint` is known.
    pub fn contains(&self, endpoint: &str) -> bool {
        normalize_endpoint(endpoint).is_ok_and(|canonical| {
            self.peers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&canonical)
        })
    }

    /// Sorted snapshot of every known endpoint, this node included.
    pub fn get_peers(&self) -> Vec<String> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Sorted snapshot of every known endpoint except this node.
    pub fn others(&self) -> Vec<String> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|p| **p != self.self_endpoint)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Always `false`: the registry holds at least this node.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_scheme_and_strips_slashes() {
        assert_eq!(
            normalize_endpoint("  127.0.0.1:5001/ ").expect("valid"),
            "http://127.0.0.1:5001"
        );
        assert_eq!(
            normalize_endpoint("https://node.example:443//").expect("valid"),
            "https://node.example:443"
        );
    }

    #[test]
    fn normalize_rejects_empty_and_hostless_input() {
        assert!(normalize_endpoint("").is_err());
        assert!(normalize_endpoint("   ").is_err());
        assert!(normalize_endpoint("http://").is_err());
        assert!(normalize_endpoint("http://a b").is_err());
    }

    #[test]
    fn register_is_idempotent_on_canonical_form() {
        let registry = PeerRegistry::new("127.0.0.1:5000").expect("self endpoint");
        assert_eq!(registry.len(), 1);

        let a = registry.register("127.0.0.1:5001").expect("register");
        let b = registry.register("http://127.0.0.1:5001/").expect("register again");
        assert_eq!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("127.0.0.1:5001/"));
    }

    #[test]
    fn others_excludes_self_and_snapshot_is_sorted() {
        let registry = PeerRegistry::new("http://127.0.0.1:5002").expect("self endpoint");
        let added = registry.extend(["127.0.0.1:5001", "", "127.0.0.1:5000"]);
        assert_eq!(added, 2);

        assert_eq!(
            registry.get_peers(),
            vec![
                "http://127.0.0.1:5000",
                "http://127.0.0.1:5001",
                "http://127.0.0.1:5002",
            ]
        );
        assert_eq!(
            registry.others(),
            vec!["http://127.0.0.1:5000", "http://127.0.0.1:5001"]
        );
        assert_eq!(registry.self_endpoint(), "http://127.0.0.1:5002");
    }
}

//! Node-level error taxonomy.
//!
//! Every operation exposed by [`crate::node::Node`] returns [`NodeError`]
//! on failure. Each variant belongs to one [`ErrorClass`], which is what
//! transports map to status codes. Peer unreachability inside a broadcast
//! never surfaces here; it only degrades vote and delivery counts.

use serde::Serialize;
use thiserror::Error;

use crate::ledger::IntegrityError;

/// Response class of a failed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Malformed or missing input, or content rejected by policy.
    Validation,
    /// Hash/proof/index/link mismatch, duplicates, stale blocks.
    Integrity,
    /// Admission vote did not pass.
    Quorum,
    /// Peer unreachable or external anchor failure.
    Dependency,
    /// Peer failed its liveness probe.
    NotReady,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Validation => "validation",
            ErrorClass::Integrity => "integrity",
            ErrorClass::Quorum => "quorum",
            ErrorClass::Dependency => "dependency",
            ErrorClass::NotReady => "not_ready",
        }
    }
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("chain integrity: {0}")]
    ChainIntegrity(#[from] IntegrityError),

    #[error("consensus not reached: {valid}/{total} nodes voted valid")]
    ConsensusRejection { valid: usize, total: usize },

    #[error("document {document_hash} already exists in the chain")]
    DuplicateDocument { document_hash: String },

    #[error("document is {pct:.2}% similar to {similar_hash}", pct = .score * 100.0)]
    NearDuplicateDocument { similar_hash: String, score: f64 },

    #[error("content contains blacklisted keyword: {keyword}")]
    ContentPolicy { keyword: String },

    #[error("peer {endpoint} unreachable: {reason}")]
    PeerUnreachable { endpoint: String, reason: String },

    #[error("node {endpoint} is not ready")]
    NotReady { endpoint: String },

    #[error("external anchor failed: {0}")]
    ExternalAnchor(String),

    #[error("proof-of-work cancelled: {0}")]
    Cancelled(String),
}

impl NodeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            NodeError::Validation(_) | NodeError::ContentPolicy { .. } => ErrorClass::Validation,
            NodeError::ChainIntegrity(_)
            | NodeError::DuplicateDocument { .. }
            | NodeError::NearDuplicateDocument { .. } => ErrorClass::Integrity,
            NodeError::ConsensusRejection { .. } => ErrorClass::Quorum,
            NodeError::PeerUnreachable { .. }
            | NodeError::ExternalAnchor(_)
            | NodeError::Cancelled(_) => ErrorClass::Dependency,
            NodeError::NotReady { .. } => ErrorClass::NotReady,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_duplicate_message_reports_percentage_and_hash() {
        let err = NodeError::NearDuplicateDocument {
            similar_hash: "abc".to_string(),
            score: 0.8125,
        };
        let msg = err.to_string();
        assert!(msg.contains("81.25%"), "unexpected message: {msg}");
        assert!(msg.contains("abc"), "unexpected message: {msg}");
        assert_eq!(err.class(), ErrorClass::Integrity);
    }

    #[test]
    fn integrity_errors_convert_with_question_mark() {
        fn check() -> Result<(), NodeError> {
            let linked: Result<(), IntegrityError> = Err(IntegrityError::Proof { index: 3 });
            linked?;
            Ok(())
        }
        let err = check().unwrap_err();
        assert_eq!(err.class(), ErrorClass::Integrity);
        assert!(err.to_string().contains("invalid proof at index 3"));
    }

    #[test]
    fn quorum_failure_is_its_own_class() {
        let err = NodeError::ConsensusRejection { valid: 1, total: 2 };
        assert_eq!(err.class(), ErrorClass::Quorum);
        assert_eq!(err.class().as_str(), "quorum");
        assert_eq!(err.to_string(), "consensus not reached: 1/2 nodes voted valid");
    }
}

// chain/src/types/tx.rs

//! Transaction type sealed into blocks.

use serde::{Deserialize, Serialize};

use super::DocumentHash;

/// A notarized document.
///
/// Created by the admission controller once a submission passes the local
/// checks and the quorum vote, then owned by the block it is sealed into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// SHA-256 of the raw document bytes.
    pub document_hash: DocumentHash,

    /// Similarity fingerprint of the normalized document text.
    ///
    /// `None` for non-text or empty content; such transactions never take
    /// part in near-duplicate detection.
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl Transaction {
    pub fn new(document_hash: DocumentHash, fingerprint: Option<String>) -> Self {
        Self {
            document_hash,
            fingerprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_null_for_missing_fingerprint() {
        let tx = Transaction::new(DocumentHash("ab".repeat(32)), None);
        let json = serde_json::to_value(&tx).expect("serialize tx");

        assert_eq!(json["document_hash"], "ab".repeat(32));
        assert!(json["fingerprint"].is_null());
    }

    #[test]
    fn fingerprint_field_may_be_omitted_by_older_peers() {
        let json = format!(r#"{{"document_hash":"{}"}}"#, "cd".repeat(32));
        let tx: Transaction = serde_json::from_str(&json).expect("tx without fingerprint");
        assert_eq!(tx.document_hash.as_str(), "cd".repeat(32));
        assert!(tx.fingerprint.is_none());
    }
}

//! Admission pipeline for new documents.
//!
//! A submission is screened locally (exact duplicate, content policy, near
//! duplicate), then every other peer screens it again against its own chain
//! and votes. The document is queued only if a strict majority of the whole
//! cluster, this node included, votes valid.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::NodeError;
use crate::ledger::Ledger;
use crate::peers::PeerClient;
use crate::replication::{ReplicationConfig, broadcast};
use crate::types::{DocumentHash, Transaction, VerifyTransactionRequest, VoteResponse};

use super::config::AdmissionConfig;
use super::extract::{TextExtractor, Utf8TextExtractor};
use super::fingerprint::Fingerprint;
use super::policy::ContentPolicy;

/// A document with its derived hash and fingerprint, ready to screen.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub document_hash: DocumentHash,
    pub fingerprint: Option<String>,
    pub filename: Option<String>,
    text: Option<String>,
    bytes: Vec<u8>,
}

impl Candidate {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn transaction(&self) -> Transaction {
        Transaction::new(self.document_hash.clone(), self.fingerprint.clone())
    }
}

/// The closest earlier document at or above the similarity threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct NearDuplicate {
    pub document_hash: DocumentHash,
    pub score: f64,
}

/// Result of a successful admission.
#[derive(Clone, Debug)]
pub struct Decision {
    pub transaction: Transaction,
    /// Index of the block expected to seal the transaction.
    pub block_index: u64,
    pub valid_votes: usize,
    pub total_votes: usize,
}

pub struct AdmissionController {
    config: AdmissionConfig,
    extractor: Arc<dyn TextExtractor>,
    policy: ContentPolicy,
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        let policy = ContentPolicy::new(&config.blacklist);
        Self {
            config,
            extractor: Arc::new(Utf8TextExtractor),
            policy,
        }
    }

    /// Replaces the default UTF-8 extractor.
    pub fn with_extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Wire-form fingerprint of raw document bytes, `None` for non-text.
    pub fn fingerprint(&self, bytes: &[u8]) -> Option<String> {
        let text = self.extractor.extract(bytes)?;
        Fingerprint::of_text(&text, self.config.scheme).map(|fp| fp.to_string())
    }

    /// Hashes and fingerprints a submission.
    pub fn prepare(&self, bytes: Vec<u8>, filename: Option<String>) -> Result<Candidate, NodeError> {
        if bytes.is_empty() {
            return Err(NodeError::Validation("document is empty".to_string()));
        }
        if bytes.len() > self.config.max_document_bytes {
            return Err(NodeError::Validation(format!(
                "document is {} bytes, limit is {}",
                bytes.len(),
                self.config.max_document_bytes
            )));
        }
        let text = self.extractor.extract(&bytes);
        let fingerprint = text
            .as_deref()
            .and_then(|t| Fingerprint::of_text(t, self.config.scheme))
            .map(|fp| fp.to_string());
        Ok(Candidate {
            document_hash: DocumentHash::compute(&bytes),
            fingerprint,
            filename,
            text,
            bytes,
        })
    }

    /// First known document whose fingerprint is at least as similar as the
    /// configured threshold.
    pub fn is_near_duplicate(&self, ledger: &Ledger, fingerprint: &str) -> Option<NearDuplicate> {
        let probe = Fingerprint::parse(fingerprint)?;
        ledger.fingerprints().find_map(|(hash, stored)| {
            let score = Fingerprint::parse(stored).map_or(0.0, |fp| probe.similarity(&fp));
            (score >= self.config.similarity_threshold).then(|| NearDuplicate {
                document_hash: hash.clone(),
                score,
            })
        })
    }

    /// Local checks against `ledger`, in order: exact duplicate, content
    /// policy, near duplicate.
    pub fn screen(&self, ledger: &Ledger, candidate: &Candidate) -> Result<(), NodeError> {
        if ledger.knows_document(candidate.document_hash.as_str()) {
            return Err(NodeError::DuplicateDocument {
                document_hash: candidate.document_hash.to_string(),
            });
        }
        if let Some(text) = &candidate.text {
            self.policy.check(text)?;
        }
        if let Some(fp) = &candidate.fingerprint {
            if let Some(near) = self.is_near_duplicate(ledger, fp) {
                return Err(NodeError::NearDuplicateDocument {
                    similar_hash: near.document_hash.to_string(),
                    score: near.score,
                });
            }
        }
        Ok(())
    }

    /// This node's verdict on a peer's vote request.
    ///
    /// The hash and fingerprint are recomputed from the shipped bytes; the
    /// claimed values are only compared, never trusted.
    pub fn vote(&self, ledger: &Ledger, request: &VerifyTransactionRequest) -> VoteResponse {
        let Some(claimed) = DocumentHash::parse(&request.document_hash) else {
            return VoteResponse::invalid("malformed document hash", None);
        };
        let bytes = match hex::decode(request.content_hex.trim()) {
            Ok(bytes) => bytes,
            Err(e) => return VoteResponse::invalid(format!("malformed document payload: {e}"), None),
        };
        let candidate = match self.prepare(bytes, request.filename.clone()) {
            Ok(candidate) => candidate,
            Err(e) => return VoteResponse::invalid(e.to_string(), None),
        };
        if candidate.document_hash != claimed {
            return VoteResponse::invalid("document hash mismatch", None);
        }
        match self.screen(ledger, &candidate) {
            Ok(()) => VoteResponse::valid(),
            Err(e) => {
                let similar_hash = match &e {
                    NodeError::NearDuplicateDocument { similar_hash, .. } => Some(similar_hash.clone()),
                    _ => None,
                };
                VoteResponse::invalid(e.to_string(), similar_hash)
            }
        }
    }

    /// Strict majority of `total` (self included); ties reject.
    pub fn tally(valid: usize, total: usize) -> Result<(), NodeError> {
        if valid * 2 > total {
            Ok(())
        } else {
            Err(NodeError::ConsensusRejection { valid, total })
        }
    }

    /// Screens locally, collects votes from `peers`, and queues the
    /// transaction on a strict majority.
    ///
    /// Peers that never answer count as negative votes. The local screen is
    /// repeated under the write lock right before the transaction is queued.
    pub async fn admit<C: PeerClient + ?Sized>(
        &self,
        ledger: &RwLock<Ledger>,
        client: &C,
        peers: &[String],
        replication: &ReplicationConfig,
        candidate: Candidate,
    ) -> Result<Decision, NodeError> {
        self.screen(&*ledger.read().await, &candidate)?;

        let request = VerifyTransactionRequest {
            document_hash: candidate.document_hash.to_string(),
            fingerprint: candidate.fingerprint.clone(),
            filename: candidate.filename.clone(),
            content_hex: hex::encode(candidate.bytes()),
        };
        let request = &request;
        let report = broadcast(peers, replication, move |peer| async move {
            client.request_vote(&peer, request).await
        })
        .await;

        for (peer, vote) in report.delivered().filter(|(_, v)| !v.is_valid) {
            debug!(peer = %peer, reason = %vote.message, "peer voted invalid");
        }
        let valid = 1 + report.delivered().filter(|(_, v)| v.is_valid).count();
        let total = peers.len() + 1;
        if let Err(e) = Self::tally(valid, total) {
            warn!(document_hash = %candidate.document_hash, valid, total, "admission rejected by vote");
            return Err(e);
        }

        let transaction = candidate.transaction();
        let block_index = {
            let mut ledger = ledger.write().await;
            self.screen(&ledger, &candidate)?;
            ledger.add_transaction(transaction.clone())
        };
        info!(document_hash = %transaction.document_hash, valid, total, "document admitted");
        Ok(Decision {
            transaction,
            block_index,
            valid_votes: valid,
            total_votes: total,
        })
    }
}

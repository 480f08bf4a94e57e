//! Node facade.
//!
//! A [`Node`] owns the ledger, the peer registry and the admission
//! controller, and exposes the logical operations that the transport layer
//! maps to routes. It is generic over the [`PeerClient`] used to reach
//! other nodes.
//!
//! The ledger sits behind one `tokio::sync::RwLock`; every mutation takes
//! the write lock, and neither network calls nor proof-of-work ever run
//! while it is held.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::admission::{AdmissionController, TextExtractor};
use crate::anchor::Anchor;
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::ledger::{BlockVerdict, Ledger, proof_of_work_cancellable};
use crate::metrics::MetricsRegistry;
use crate::peers::{PeerClient, PeerRegistry, discover, normalize_endpoint, probe_liveness};
use crate::replication::{broadcast, replace_chain, resync_on_conflict, sync_chain};
use crate::types::{
    Block, BlockAck, BlockProposal, ChainPayload, DocumentHash, DocumentStatus, EnqueueReceipt,
    HealthReport, MineOutcome, PeerList, PeerPayload, SubmitReceipt, SyncOutcome, Transaction,
    VerifyTransactionRequest, VoteResponse,
};

/// Sets the flag when dropped, so an abandoned caller stops its search.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

pub struct Node<C> {
    config: NodeConfig,
    ledger: Arc<RwLock<Ledger>>,
    registry: PeerRegistry,
    client: C,
    admission: AdmissionController,
    anchor: Option<Arc<dyn Anchor>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<C: PeerClient> Node<C> {
    /// Creates a node holding only the genesis block and knowing only
    /// itself.
    pub fn new(config: NodeConfig, client: C) -> Result<Self, NodeError> {
        let registry = PeerRegistry::new(&config.endpoint)?;
        let admission = AdmissionController::new(config.admission.clone());
        Ok(Self {
            config,
            ledger: Arc::new(RwLock::new(Ledger::in_memory())),
            registry,
            client,
            admission,
            anchor: None,
            metrics: None,
        })
    }

    pub fn with_anchor(mut self, anchor: impl Anchor + 'static) -> Self {
        self.anchor = Some(Arc::new(anchor));
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.admission = self.admission.with_extractor(extractor);
        self
    }

    /// This node's canonical endpoint.
    pub fn endpoint(&self) -> &str {
        self.registry.self_endpoint()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn ledger(&self) -> &RwLock<Ledger> {
        &self.ledger
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Joins the cluster through the configured bootstrap node: registers
    /// with it, unions its peer list, then pulls the longest valid chain.
    pub async fn join(&self) -> Result<(), NodeError> {
        let Some(bootstrap) = self.config.bootstrap.as_deref() else {
            return Ok(());
        };
        let bootstrap = normalize_endpoint(bootstrap)?;
        if bootstrap == self.endpoint() {
            return Ok(());
        }

        let payload = PeerPayload {
            node_url: self.endpoint().to_string(),
        };
        let list = self
            .client
            .register(&bootstrap, &payload)
            .await
            .map_err(|e| NodeError::PeerUnreachable {
                endpoint: bootstrap.clone(),
                reason: e.to_string(),
            })?;
        self.registry.extend(list.nodes);
        discover(&self.client, &self.registry, &bootstrap).await?;
        self.update_peer_gauge();

        let outcome = self.pull_chain().await;
        info!(
            bootstrap = %bootstrap,
            peers = self.registry.len(),
            length = outcome.length,
            "joined cluster"
        );
        Ok(())
    }

    /// submit-document: admission, gossip, mining and block proposal.
    ///
    /// Once the vote passes the document stays admitted even if sealing
    /// fails; it then waits in the pending pool for the next block.
    pub async fn submit_document(
        &self,
        bytes: Vec<u8>,
        filename: Option<String>,
    ) -> Result<SubmitReceipt, NodeError> {
        let candidate = self.admission.prepare(bytes, filename)?;
        self.catch_up().await;
        let peers = self.registry.others();
        let decision = match self
            .admission
            .admit(
                &self.ledger,
                &self.client,
                &peers,
                &self.config.replication,
                candidate,
            )
            .await
        {
            Ok(decision) => {
                self.record_admission("accepted");
                decision
            }
            Err(e) => {
                self.record_admission(e.class().as_str());
                return Err(e);
            }
        };

        if let Some(anchor) = &self.anchor {
            if let Err(e) = anchor.anchor(&decision.transaction).await {
                warn!(document_hash = %decision.transaction.document_hash, error = %e, "anchor write failed");
            }
        }

        self.gossip_transaction(&peers, &decision.transaction).await;

        let document_hash = decision.transaction.document_hash.clone();
        if let Err(e) = self.mine_and_propose().await {
            warn!(document_hash = %document_hash, error = %e, "document admitted but not sealed");
        }
        // A concurrent request may have sealed the pool first.
        let sealed_in = self
            .ledger
            .read()
            .await
            .locate_document(document_hash.as_str());

        Ok(SubmitReceipt {
            document_hash,
            block_index: sealed_in.unwrap_or(decision.block_index),
            valid_votes: decision.valid_votes,
            total_votes: decision.total_votes,
            sealed: sealed_in.is_some(),
        })
    }

    /// verify-document-exists: is a document with these bytes sealed?
    pub async fn verify_document(&self, bytes: &[u8]) -> Result<DocumentStatus, NodeError> {
        if bytes.is_empty() {
            return Err(NodeError::Validation("document is empty".to_string()));
        }
        let document_hash = DocumentHash::compute(bytes);
        let is_verified = self
            .ledger
            .read()
            .await
            .verify_document(document_hash.as_str());
        Ok(DocumentStatus {
            document_hash,
            is_verified,
        })
    }

    /// get-chain: a snapshot of the local chain.
    pub async fn get_chain(&self) -> ChainPayload {
        ChainPayload::new(self.ledger.read().await.chain().to_vec())
    }

    /// pull-and-sync-chain: adopt the first longer valid chain, trying the
    /// bootstrap node first.
    pub async fn pull_chain(&self) -> SyncOutcome {
        let candidates = self.sync_candidates();
        let replaced = replace_chain(
            &self.client,
            &self.ledger,
            &candidates,
            &self.config.replication,
        )
        .await;
        self.after_sync(replaced).await
    }

    /// Pulls a chain from the bootstrap node or the peers while this node
    /// holds only the genesis block.
    ///
    /// Covers a node whose join failed or that started before its peers.
    /// Bounded by half the per-attempt timeout, so a vote served right after
    /// still answers before the requesting peer gives up.
    async fn catch_up(&self) {
        if self.ledger.read().await.len() > 1 || self.sync_candidates().is_empty() {
            return;
        }
        let budget = self.config.replication.attempt_timeout / 2;
        match tokio::time::timeout(budget, self.pull_chain()).await {
            Ok(outcome) if outcome.replaced => {
                info!(length = outcome.length, "caught up from genesis")
            }
            Ok(_) => {}
            Err(_) => debug!(?budget, "catch-up pull timed out"),
        }
    }

    /// sync: offer of a full chain pushed by a peer.
    pub async fn sync_chain(&self, payload: ChainPayload) -> SyncOutcome {
        let replaced = sync_chain(&self.ledger, payload.chain).await;
        self.after_sync(replaced).await
    }

    /// propose-block: runs the acceptance state machine on a peer's block.
    ///
    /// A block that links to neither the tip nor its parent triggers one
    /// resync with the sender before the final evaluation.
    pub async fn handle_block_proposal(
        &self,
        proposal: BlockProposal,
    ) -> Result<BlockAck, NodeError> {
        let BlockProposal { block, sender } = proposal;
        let index = block.index;

        let linked = self.ledger.read().await.evaluate_block(&block);
        if linked == BlockVerdict::RejectPrevHash {
            let sender = sender.as_deref().and_then(|s| normalize_endpoint(s).ok());
            match sender {
                Some(sender) if sender != self.endpoint() => {
                    let replaced = resync_on_conflict(
                        &self.client,
                        &self.ledger,
                        &sender,
                        &self.config.replication,
                    )
                    .await;
                    if replaced {
                        self.after_sync(true).await;
                    }
                }
                _ => debug!(index, "link conflict without a usable sender"),
            }
        }

        let (result, length) = {
            let mut ledger = self.ledger.write().await;
            let result = ledger.accept_block(block);
            (result, ledger.len())
        };
        match result {
            Ok(verdict) => {
                if let Some(m) = &self.metrics {
                    m.ledger.peer_blocks.with_label_values(&[verdict.as_str()]).inc();
                    m.ledger.chain_length.set(length as i64);
                }
                Ok(BlockAck {
                    verdict: verdict.as_str().to_string(),
                    length,
                })
            }
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.ledger.peer_blocks.with_label_values(&["rejected"]).inc();
                }
                debug!(index, error = %e, "peer block rejected");
                Err(e.into())
            }
        }
    }

    /// enqueue-transaction: adds a gossiped transaction to the pending pool
    /// unless it is already known.
    pub async fn enqueue_transaction(&self, tx: Transaction) -> Result<EnqueueReceipt, NodeError> {
        let document_hash = DocumentHash::parse(tx.document_hash.as_str())
            .ok_or_else(|| NodeError::Validation("malformed document hash".to_string()))?;
        let tx = Transaction::new(document_hash, tx.fingerprint);

        let mut ledger = self.ledger.write().await;
        if ledger.knows_document(tx.document_hash.as_str()) {
            return Ok(EnqueueReceipt {
                queued: false,
                block_index: ledger.last_block().index + 1,
            });
        }
        let block_index = ledger.add_transaction(tx);
        Ok(EnqueueReceipt {
            queued: true,
            block_index,
        })
    }

    /// verify-transaction-vote: this node's independent admission verdict.
    pub async fn verify_transaction_vote(&self, request: &VerifyTransactionRequest) -> VoteResponse {
        self.catch_up().await;
        let ledger = self.ledger.read().await;
        self.admission.vote(&ledger, request)
    }

    /// get-peers: sorted snapshot, this node included.
    pub fn get_peers(&self) -> PeerList {
        PeerList {
            nodes: self.registry.get_peers(),
        }
    }

    /// register-peer: probes the newcomer, records it, tells the other
    /// peers about it and pushes the local chain to it.
    pub async fn register_peer(&self, node_url: &str) -> Result<PeerList, NodeError> {
        let canonical = normalize_endpoint(node_url)?;
        if canonical == self.endpoint() {
            return Ok(self.get_peers());
        }

        let replication = &self.config.replication;
        if !probe_liveness(
            &self.client,
            &canonical,
            replication.liveness_retries,
            replication.liveness_delay,
        )
        .await
        {
            return Err(NodeError::NotReady {
                endpoint: canonical,
            });
        }

        let is_new = !self.registry.contains(&canonical);
        self.registry.register(&canonical)?;
        self.update_peer_gauge();

        if is_new {
            let others: Vec<String> = self
                .registry
                .others()
                .into_iter()
                .filter(|p| *p != canonical)
                .collect();
            let payload = PeerPayload {
                node_url: canonical.clone(),
            };
            let client = &self.client;
            let payload = &payload;
            let report = broadcast(&others, replication, move |peer| async move {
                client.add_peer(&peer, payload).await
            })
            .await;
            debug!(peer = %canonical, delivered = report.delivered_count(), "new peer gossiped");
        }

        let chain = self.get_chain().await;
        match tokio::time::timeout(
            replication.attempt_timeout,
            self.client.push_chain(&canonical, &chain),
        )
        .await
        {
            Ok(Ok(outcome)) => {
                debug!(peer = %canonical, replaced = outcome.replaced, "chain pushed to new peer")
            }
            Ok(Err(e)) => warn!(peer = %canonical, error = %e, "chain push failed"),
            Err(_) => warn!(peer = %canonical, "chain push timed out"),
        }

        Ok(self.get_peers())
    }

    /// add-peer: records an endpoint without probing or gossip.
    pub fn add_peer(&self, node_url: &str) -> Result<PeerList, NodeError> {
        self.registry.register(node_url)?;
        self.update_peer_gauge();
        Ok(self.get_peers())
    }

    /// health-check.
    pub async fn health(&self) -> HealthReport {
        let ledger = self.ledger.read().await;
        HealthReport {
            status: "ok".to_string(),
            endpoint: self.endpoint().to_string(),
            chain_length: ledger.len(),
            pending: ledger.pending().len(),
            peers: self.registry.len(),
        }
    }

    /// mine: seals the pending pool, if any, and proposes the block.
    pub async fn mine_pending(&self) -> Result<MineOutcome, NodeError> {
        Ok(MineOutcome {
            block: self.mine_and_propose().await?,
        })
    }

    async fn mine_and_propose(&self) -> Result<Option<Block>, NodeError> {
        let attempts = self.config.ledger.max_seal_attempts.max(1);
        for attempt in 1..=attempts {
            let target = {
                let ledger = self.ledger.read().await;
                if ledger.pending().is_empty() {
                    return Ok(None);
                }
                ledger.mining_target()
            };

            let proof = self.run_pow(target.previous_proof).await?;

            let sealed = {
                let mut ledger = self.ledger.write().await;
                if ledger.pending().is_empty() {
                    return Ok(None);
                }
                let sealed = ledger.seal(&target, proof);
                if let Some(m) = &self.metrics {
                    m.ledger.chain_length.set(ledger.len() as i64);
                }
                sealed
            };

            if let Some(block) = sealed {
                if let Some(m) = &self.metrics {
                    m.ledger.blocks_sealed.inc();
                }
                self.propose(&block).await;
                return Ok(Some(block));
            }
            debug!(attempt, "tip moved while mining, retrying");
        }
        Err(NodeError::Cancelled(format!(
            "tip kept moving after {attempts} attempts"
        )))
    }

    /// Runs the proof-of-work search off the async runtime.
    ///
    /// The search stops when the timeout elapses or when this future is
    /// dropped.
    async fn run_pow(&self, previous_proof: u64) -> Result<u64, NodeError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(cancel.clone());
        let flag = cancel.clone();
        let started = Instant::now();

        let search =
            tokio::task::spawn_blocking(move || proof_of_work_cancellable(previous_proof, &flag));
        let timeout = self.config.ledger.pow_timeout;
        let result = match tokio::time::timeout(timeout, search).await {
            Ok(Ok(Some(proof))) => Ok(proof),
            Ok(Ok(None)) => Err(NodeError::Cancelled("search abandoned".to_string())),
            Ok(Err(e)) => Err(NodeError::Cancelled(format!("search task failed: {e}"))),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                Err(NodeError::Cancelled(format!(
                    "no proof within {timeout:?}"
                )))
            }
        };

        if let Some(m) = &self.metrics {
            m.ledger.pow_seconds.observe(started.elapsed().as_secs_f64());
        }
        result
    }

    async fn propose(&self, block: &Block) {
        let proposal = BlockProposal {
            block: block.clone(),
            sender: Some(self.endpoint().to_string()),
        };
        let peers = self.registry.others();
        let client = &self.client;
        let proposal = &proposal;
        let report = broadcast(&peers, &self.config.replication, move |peer| async move {
            client.propose_block(&peer, proposal).await
        })
        .await;
        let failed = report.failed();
        if failed.is_empty() {
            info!(index = block.index, peers = peers.len(), "block proposed");
        } else {
            warn!(index = block.index, failed = ?failed, "block not accepted by every peer");
        }
    }

    async fn gossip_transaction(&self, peers: &[String], tx: &Transaction) {
        let client = &self.client;
        let report = broadcast(peers, &self.config.replication, move |peer| async move {
            client.enqueue_transaction(&peer, tx).await
        })
        .await;
        debug!(
            document_hash = %tx.document_hash,
            delivered = report.delivered_count(),
            "transaction gossiped"
        );
    }

    /// Bootstrap node first, then every other peer.
    fn sync_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        if let Some(bootstrap) = self
            .config
            .bootstrap
            .as_deref()
            .and_then(|b| normalize_endpoint(b).ok())
        {
            if bootstrap != self.endpoint() {
                candidates.push(bootstrap);
            }
        }
        for peer in self.registry.others() {
            if !candidates.contains(&peer) {
                candidates.push(peer);
            }
        }
        candidates
    }

    async fn after_sync(&self, replaced: bool) -> SyncOutcome {
        let length = self.ledger.read().await.len();
        if let Some(m) = &self.metrics {
            if replaced {
                m.ledger.chain_replacements.inc();
            }
            m.ledger.chain_length.set(length as i64);
        }
        SyncOutcome { replaced, length }
    }

    fn record_admission(&self, outcome: &str) {
        if let Some(m) = &self.metrics {
            m.ledger.admissions.with_label_values(&[outcome]).inc();
        }
    }

    fn update_peer_gauge(&self) {
        if let Some(m) = &self.metrics {
            m.ledger.known_peers.set(self.registry.len() as i64);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorClass;
    use crate::ledger::proof_of_work;
    use crate::peers::HttpPeerClient;

    fn lone_node() -> Node<HttpPeerClient> {
        let client = HttpPeerClient::new(Duration::from_millis(200)).expect("client");
        Node::new(NodeConfig::default(), client).expect("node")
    }

    #[tokio::test]
    async fn lone_node_admits_and_seals_immediately() {
        let node = lone_node();
        let receipt = node
            .submit_document(b"the first notarized document".to_vec(), Some("a.txt".into()))
            .await
            .expect("admitted");

        assert!(receipt.sealed);
        assert_eq!(receipt.block_index, 2);
        assert_eq!((receipt.valid_votes, receipt.total_votes), (1, 1));

        let status = node
            .verify_document(b"the first notarized document")
            .await
            .expect("verify");
        assert!(status.is_verified);
        assert_eq!(node.get_chain().await.length, 2);
    }

    #[tokio::test]
    async fn resubmission_is_a_duplicate() {
        let node = lone_node();
        node.submit_document(b"same bytes twice".to_vec(), None)
            .await
            .expect("first submission");
        let err = node
            .submit_document(b"same bytes twice".to_vec(), None)
            .await
            .expect_err("second submission");
        assert!(matches!(err, NodeError::DuplicateDocument { .. }));
        assert_eq!(err.class(), ErrorClass::Integrity);
    }

    #[tokio::test]
    async fn empty_documents_are_rejected_up_front() {
        let node = lone_node();
        assert!(matches!(
            node.submit_document(Vec::new(), None).await,
            Err(NodeError::Validation(_))
        ));
        assert!(matches!(
            node.verify_document(&[]).await,
            Err(NodeError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn enqueue_is_idempotent_and_validates_hash() {
        let node = lone_node();
        let tx = Transaction::new(DocumentHash::compute(b"gossiped"), None);

        let first = node.enqueue_transaction(tx.clone()).await.expect("enqueue");
        let second = node.enqueue_transaction(tx).await.expect("enqueue again");
        assert!(first.queued);
        assert!(!second.queued);
        assert_eq!(node.health().await.pending, 1);

        let bad = Transaction::new(DocumentHash("nothex".into()), None);
        assert!(matches!(
            node.enqueue_transaction(bad).await,
            Err(NodeError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn mine_pending_seals_queued_transactions_only_when_present() {
        let node = lone_node();
        assert!(node.mine_pending().await.expect("mine").block.is_none());

        node.enqueue_transaction(Transaction::new(DocumentHash::compute(b"x"), None))
            .await
            .expect("enqueue");
        let block = node.mine_pending().await.expect("mine").block.expect("sealed");
        assert_eq!(block.index, 2);
        assert_eq!(node.health().await.pending, 0);
    }

    #[tokio::test]
    async fn proposal_extending_tip_is_appended() {
        let node = lone_node();
        let genesis = Block::genesis();
        let block = Block {
            index: 2,
            timestamp: 10.0,
            transactions: vec![Transaction::new(DocumentHash::compute(b"remote"), None)],
            proof: proof_of_work(genesis.proof),
            previous_hash: genesis.compute_hash(),
        };

        let ack = node
            .handle_block_proposal(BlockProposal {
                block: block.clone(),
                sender: None,
            })
            .await
            .expect("accepted");
        assert_eq!(ack.verdict, "accept_append");
        assert_eq!(ack.length, 2);

        let err = node
            .handle_block_proposal(BlockProposal {
                block,
                sender: None,
            })
            .await
            .expect_err("same block again is stale");
        assert_eq!(err.class(), ErrorClass::Integrity);
    }

    #[tokio::test]
    async fn pow_timeout_surfaces_as_cancellation() {
        let mut config = NodeConfig::default();
        config.ledger.pow_timeout = Duration::ZERO;
        let client = HttpPeerClient::new(Duration::from_millis(200)).expect("client");
        let node = Node::new(config, client).expect("node");

        // Proof for a parent whose answer is not trivially small.
        let previous = (1..)
            .find(|q| proof_of_work(*q) > 10_000)
            .expect("some slow puzzle");
        let err = node.run_pow(previous).await.expect_err("zero timeout");
        assert!(matches!(err, NodeError::Cancelled(_)));
    }

    #[tokio::test]
    async fn add_peer_and_health_report_membership() {
        let node = lone_node();
        let peers = node.add_peer("127.0.0.1:5001/").expect("add");
        assert_eq!(
            peers.nodes,
            vec!["http://127.0.0.1:5000", "http://127.0.0.1:5001"]
        );
        assert!(node.add_peer("   ").is_err());
        assert_eq!(node.health().await.peers, 2);
    }
}

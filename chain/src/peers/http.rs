//! HTTP implementation of [`PeerClient`].
//!
//! Talks to the routes served by the node binary:
//!
//! ```text
//! GET  /health               health-check
//! GET  /peers                get-peers
//! GET  /chain                get-chain
//! POST /peers/register       register-peer    { "node_url": ... }
//! POST /peers                add-peer         { "node_url": ... }
//! POST /chain/sync           sync             { "chain": [...], "length": n }
//! POST /blocks               propose-block    { "block": {...}, "sender": ... }
//! POST /transactions         enqueue-transaction { "transaction": {...} }
//! POST /transactions/verify  verify-transaction-vote
//! ```
//!
//! Error replies carry `{ "error": <class>, "message": <reason> }`; the
//! message is surfaced in [`PeerError::Status`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{
    BlockProposal, ChainPayload, PeerList, PeerPayload, SyncOutcome, Transaction,
    VerifyTransactionRequest, VoteResponse,
};

use super::client::{PeerClient, PeerError};

/// HTTP peer client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct HttpPeerClient {
    client: Client,
}

#[derive(Serialize)]
struct WrappedTransaction<'a> {
    transaction: &'a Transaction,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpPeerClient {
    /// Builds a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, PeerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PeerError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn get_json<T: DeserializeOwned>(&self, peer: &str, path: &str) -> Result<T, PeerError> {
        let url = endpoint(peer, path);
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        decode(check_status(resp).await?).await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        peer: &str,
        path: &str,
        body: &B,
    ) -> Result<Response, PeerError> {
        let url = endpoint(peer, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        check_status(resp).await
    }
}

fn endpoint(peer: &str, path: &str) -> String {
    // Avoid accidental double slashes.
    format!(
        "{}/{}",
        peer.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn transport(e: reqwest::Error) -> PeerError {
    if e.is_timeout() {
        PeerError::Timeout
    } else {
        PeerError::Transport(e.to_string())
    }
}

async fn check_status(resp: Response) -> Result<Response, PeerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);
    Err(PeerError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, PeerError> {
    resp.json::<T>()
        .await
        .map_err(|e| PeerError::Protocol(format!("failed to parse JSON response: {e}")))
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn health(&self, peer: &str) -> Result<(), PeerError> {
        let url = endpoint(peer, "/health");
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        check_status(resp).await.map(|_| ())
    }

    async fn get_peers(&self, peer: &str) -> Result<PeerList, PeerError> {
        self.get_json(peer, "/peers").await
    }

    async fn get_chain(&self, peer: &str) -> Result<ChainPayload, PeerError> {
        self.get_json(peer, "/chain").await
    }

    async fn register(&self, peer: &str, payload: &PeerPayload) -> Result<PeerList, PeerError> {
        decode(self.post(peer, "/peers/register", payload).await?).await
    }

    async fn add_peer(&self, peer: &str, payload: &PeerPayload) -> Result<(), PeerError> {
        self.post(peer, "/peers", payload).await.map(|_| ())
    }

    async fn push_chain(
        &self,
        peer: &str,
        payload: &ChainPayload,
    ) -> Result<SyncOutcome, PeerError> {
        decode(self.post(peer, "/chain/sync", payload).await?).await
    }

    async fn propose_block(&self, peer: &str, proposal: &BlockProposal) -> Result<(), PeerError> {
        self.post(peer, "/blocks", proposal).await.map(|_| ())
    }

    async fn enqueue_transaction(&self, peer: &str, tx: &Transaction) -> Result<(), PeerError> {
        let body = WrappedTransaction { transaction: tx };
        self.post(peer, "/transactions", &body).await.map(|_| ())
    }

    async fn request_vote(
        &self,
        peer: &str,
        request: &VerifyTransactionRequest,
    ) -> Result<VoteResponse, PeerError> {
        decode(self.post(peer, "/transactions/verify", request).await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint("http://127.0.0.1:5000/", "/chain"),
            "http://127.0.0.1:5000/chain"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:5000", "peers/register"),
            "http://127.0.0.1:5000/peers/register"
        );
    }

    #[test]
    fn transaction_is_wrapped_on_the_wire() {
        let tx = Transaction::new(crate::types::DocumentHash("aa".repeat(32)), None);
        let json = serde_json::to_value(WrappedTransaction { transaction: &tx }).expect("json");
        assert_eq!(json["transaction"]["document_hash"], "aa".repeat(32));
    }

    #[tokio::test]
    async fn unreachable_peer_is_a_retryable_transport_error() {
        let client = HttpPeerClient::new(Duration::from_millis(500)).expect("client");
        // Port 9 (discard) on loopback is practically never served.
        let err = client
            .health("http://127.0.0.1:9")
            .await
            .expect_err("nothing listens there");
        assert!(err.is_retryable(), "unexpected error: {err}");
    }
}

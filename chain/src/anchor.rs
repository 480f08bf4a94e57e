//! Optional write-through sink for admitted documents.
//!
//! An anchor runs after a document is accepted locally. Its failures are
//! logged by the caller and never undo or block an admission.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::NodeError;
use crate::types::Transaction;

#[async_trait]
pub trait Anchor: Send + Sync {
    async fn anchor(&self, tx: &Transaction) -> Result<(), NodeError>;
}

/// Posts `{ "document_hash": ... }` as JSON to a fixed URL.
#[derive(Clone, Debug)]
pub struct HttpAnchor {
    url: String,
    client: Client,
}

#[derive(Serialize)]
struct AnchorRequest<'a> {
    document_hash: &'a str,
}

impl HttpAnchor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::ExternalAnchor(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Anchor for HttpAnchor {
    async fn anchor(&self, tx: &Transaction) -> Result<(), NodeError> {
        let body = AnchorRequest {
            document_hash: tx.document_hash.as_str(),
        };
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NodeError::ExternalAnchor(format!("POST {} failed: {e}", self.url)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NodeError::ExternalAnchor(format!(
                "anchor service returned HTTP status {status}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::types::DocumentHash;

    #[test]
    fn request_body_carries_only_the_document_hash() {
        let hash = "cd".repeat(32);
        let json = serde_json::to_value(AnchorRequest {
            document_hash: &hash,
        })
        .expect("json");
        assert_eq!(json, serde_json::json!({ "document_hash": hash }));
    }

    #[tokio::test]
    async fn unreachable_anchor_is_a_dependency_failure() {
        let anchor = HttpAnchor::new("http://127.0.0.1:9/anchor", Duration::from_millis(500))
            .expect("client");
        let tx = Transaction::new(DocumentHash::compute(b"doc"), None);
        let err = anchor.anchor(&tx).await.expect_err("nothing listens there");
        assert_eq!(err.class(), ErrorClass::Dependency);
    }
}

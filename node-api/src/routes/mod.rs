//! HTTP routes, one module per resource.

pub mod blocks;
pub mod chain;
pub mod documents;
pub mod health;
pub mod peers;
pub mod transactions;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::SharedState;

/// Room for JSON fields, multipart headers and chain payloads on top of a
/// hex-encoded document.
const BODY_OVERHEAD: usize = 1024 * 1024;

/// Request body cap for a node accepting documents of up to
/// `max_document_bytes`. Vote requests carry the document hex-encoded.
pub fn body_limit(max_document_bytes: usize) -> usize {
    max_document_bytes
        .saturating_mul(2)
        .saturating_add(BODY_OVERHEAD)
}

/// Builds the full API router over `state`.
pub fn router(state: SharedState) -> Router {
    let limit = body_limit(state.config().admission.max_document_bytes);
    Router::new()
        .route("/health", get(health::health))
        .route("/documents", post(documents::submit))
        .route("/documents/verify", post(documents::verify))
        .route("/chain", get(chain::get_chain))
        .route("/chain/pull", post(chain::pull))
        .route("/chain/sync", post(chain::sync))
        .route("/blocks", post(blocks::propose))
        .route("/blocks/mine", post(blocks::mine))
        .route("/transactions", post(transactions::enqueue))
        .route("/transactions/verify", post(transactions::vote))
        .route("/peers", get(peers::list).post(peers::add))
        .route("/peers/register", post(peers::register))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use notary_chain::{DocumentHash, HttpPeerClient, Node, NodeConfig};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const BOUNDARY: &str = "notary-test-boundary";

    fn app() -> Router {
        app_with(NodeConfig::default())
    }

    fn app_with(config: NodeConfig) -> Router {
        let client = HttpPeerClient::new(Duration::from_millis(200)).expect("client");
        let node = Node::new(config, client).expect("node");
        router(Arc::new(node))
    }

    fn vote_body(content: &[u8]) -> Value {
        serde_json::json!({
            "document_hash": DocumentHash::compute(content).to_string(),
            "content_hex": hex::encode(content),
        })
    }

    fn multipart(uri: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"doc.txt\"\r\nContent-Type: text/plain\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn json(uri: &str, value: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request")
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_genesis_only_chain() {
        let app = app();
        let req = Request::get("/health").body(Body::empty()).expect("request");
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["chain_length"], 1);
    }

    #[tokio::test]
    async fn submitted_document_is_verifiable_and_duplicate_conflicts() {
        let app = app();
        let content = b"minutes of the board meeting held in march";

        let (status, receipt) = send(&app, multipart("/documents", content)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["sealed"], true);

        let (status, verified) = send(&app, multipart("/documents/verify", content)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verified["is_verified"], true);
        assert_eq!(verified["document_hash"], receipt["document_hash"]);

        let (status, err) = send(&app, multipart("/documents", content)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["error"], "integrity");

        let req = Request::get("/chain").body(Body::empty()).expect("request");
        let (_, chain) = send(&app, req).await;
        assert_eq!(chain["length"], 2);
    }

    #[tokio::test]
    async fn missing_file_field_is_a_validation_error() {
        let app = app();
        let req = Request::post("/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(format!("--{BOUNDARY}--\r\n")))
            .expect("request");
        let (status, err) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "validation");
    }

    #[tokio::test]
    async fn enqueue_accepts_wrapped_transactions_once() {
        let app = app();
        let tx = serde_json::json!({ "transaction": { "document_hash": "ab".repeat(32) } });

        let (status, first) = send(&app, json("/transactions", tx.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["queued"], true);

        let (_, second) = send(&app, json("/transactions", tx)).await;
        assert_eq!(second["queued"], false);

        let (status, mined) = send(&app, json("/blocks/mine", Value::Null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mined["block"]["index"], 2);
    }

    #[tokio::test]
    async fn add_peer_normalizes_and_lists() {
        let app = app();
        let (status, peers) = send(
            &app,
            json("/peers", serde_json::json!({ "node_url": "127.0.0.1:5001/" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            peers["nodes"],
            serde_json::json!(["http://127.0.0.1:5000", "http://127.0.0.1:5001"])
        );
    }

    #[tokio::test]
    async fn vote_on_megabyte_document_is_not_cut_off_by_body_limit() {
        let app = app();
        let content = vec![0u8; 1_200_000];
        let (status, vote) = send(&app, json("/transactions/verify", vote_body(&content))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(vote["is_valid"], true, "vote: {vote}");
    }

    #[tokio::test]
    async fn document_size_limit_is_enforced_by_admission_not_transport() {
        let mut config = NodeConfig::default();
        config.admission.max_document_bytes = 1_000_000;
        let app = app_with(config);

        let at_limit = vec![0u8; 1_000_000];
        let (status, vote) = send(&app, json("/transactions/verify", vote_body(&at_limit))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(vote["is_valid"], true, "vote: {vote}");

        let over = vec![0u8; 1_000_001];
        let (status, vote) = send(&app, json("/transactions/verify", vote_body(&over))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(vote["is_valid"], false);

        let (status, err) = send(&app, multipart("/documents", &over)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "validation");
    }

    #[test]
    fn body_limit_leaves_room_for_hex_encoding() {
        assert!(body_limit(1_000_000) > 2 * 1_000_000);
        assert_eq!(body_limit(usize::MAX), usize::MAX);
    }
}

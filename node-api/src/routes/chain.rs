use axum::{Json, extract::State};

use notary_chain::{ChainPayload, SyncOutcome};

use crate::state::SharedState;

/// `GET /chain`
pub async fn get_chain(State(node): State<SharedState>) -> Json<ChainPayload> {
    Json(node.get_chain().await)
}

/// `POST /chain/pull`
///
/// Replaces the local chain with the first longer valid one among the
/// bootstrap node and known peers.
pub async fn pull(State(node): State<SharedState>) -> Json<SyncOutcome> {
    Json(node.pull_chain().await)
}

/// `POST /chain/sync`
///
/// Chain pushed by a peer; adopted only if longer and valid.
pub async fn sync(
    State(node): State<SharedState>,
    Json(payload): Json<ChainPayload>,
) -> Json<SyncOutcome> {
    Json(node.sync_chain(payload).await)
}

use axum::{Json, extract::State, http::StatusCode};

use notary_chain::{PeerList, PeerPayload};

use crate::error::ApiError;
use crate::state::SharedState;

/// `GET /peers`
pub async fn list(State(node): State<SharedState>) -> Json<PeerList> {
    Json(node.get_peers())
}

/// `POST /peers/register`
///
/// Probes the newcomer, gossips it to the other peers and pushes the local
/// chain to it. Replies with every known peer.
pub async fn register(
    State(node): State<SharedState>,
    Json(payload): Json<PeerPayload>,
) -> Result<(StatusCode, Json<PeerList>), ApiError> {
    let peers = node.register_peer(&payload.node_url).await?;
    Ok((StatusCode::CREATED, Json(peers)))
}

/// `POST /peers`
pub async fn add(
    State(node): State<SharedState>,
    Json(payload): Json<PeerPayload>,
) -> Result<Json<PeerList>, ApiError> {
    Ok(Json(node.add_peer(&payload.node_url)?))
}

use axum::{Json, extract::State};

use notary_chain::{BlockAck, BlockProposal, MineOutcome};

use crate::error::ApiError;
use crate::state::SharedState;

/// `POST /blocks`
///
/// A block proposed by a peer. Rejections map to 409.
pub async fn propose(
    State(node): State<SharedState>,
    Json(proposal): Json<BlockProposal>,
) -> Result<Json<BlockAck>, ApiError> {
    Ok(Json(node.handle_block_proposal(proposal).await?))
}

/// `POST /blocks/mine`
pub async fn mine(State(node): State<SharedState>) -> Result<Json<MineOutcome>, ApiError> {
    Ok(Json(node.mine_pending().await?))
}

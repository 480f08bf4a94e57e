use axum::{Json, extract::State, http::StatusCode};

use notary_chain::{EnqueueReceipt, TransactionEnvelope, VerifyTransactionRequest, VoteResponse};

use crate::error::ApiError;
use crate::state::SharedState;

/// `POST /transactions`
///
/// Gossiped transaction from a peer, bare or wrapped in
/// `{ "transaction": ... }`.
pub async fn enqueue(
    State(node): State<SharedState>,
    Json(envelope): Json<TransactionEnvelope>,
) -> Result<(StatusCode, Json<EnqueueReceipt>), ApiError> {
    let receipt = node.enqueue_transaction(envelope.into_inner()).await?;
    let status = if receipt.queued {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(receipt)))
}

/// `POST /transactions/verify`
///
/// Always 200; a negative vote is carried in the body.
pub async fn vote(
    State(node): State<SharedState>,
    Json(request): Json<VerifyTransactionRequest>,
) -> Json<VoteResponse> {
    Json(node.verify_transaction_vote(&request).await)
}

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

use notary_chain::{DocumentStatus, NodeError, SubmitReceipt};

use crate::error::ApiError;
use crate::state::SharedState;

/// Reads the multipart field `file`, returning its bytes and filename.
async fn read_file(mut multipart: Multipart) -> Result<(Vec<u8>, Option<String>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| NodeError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| NodeError::Validation(e.body_text()))?;
        return Ok((bytes.to_vec(), filename));
    }
    Err(NodeError::Validation("multipart field `file` is missing".to_string()).into())
}

/// `POST /documents`
///
/// Runs admission (local checks and the peer vote), then seals the
/// document into a block.
pub async fn submit(
    State(node): State<SharedState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitReceipt>), ApiError> {
    let (bytes, filename) = read_file(multipart).await?;
    let receipt = node.submit_document(bytes, filename).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `POST /documents/verify`
pub async fn verify(
    State(node): State<SharedState>,
    multipart: Multipart,
) -> Result<Json<DocumentStatus>, ApiError> {
    let (bytes, _) = read_file(multipart).await?;
    Ok(Json(node.verify_document(&bytes).await?))
}

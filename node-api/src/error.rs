//! Mapping of node errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use notary_chain::{ErrorClass, NodeError};

/// Error body: `{"error": <class>, "message": <reason>}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError(pub NodeError);

impl From<NodeError> for ApiError {
    fn from(err: NodeError) -> Self {
        ApiError(err)
    }
}

pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::Validation => StatusCode::BAD_REQUEST,
        ErrorClass::Integrity => StatusCode::CONFLICT,
        ErrorClass::Quorum => StatusCode::FORBIDDEN,
        ErrorClass::Dependency => StatusCode::BAD_GATEWAY,
        ErrorClass::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let class = self.0.class();
        let status = status_for(class);
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        let body = ErrorBody {
            error: class.as_str(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_map_to_distinct_statuses() {
        let cases = [
            (NodeError::Validation("x".into()), 400),
            (NodeError::DuplicateDocument { document_hash: "h".into() }, 409),
            (NodeError::ConsensusRejection { valid: 1, total: 2 }, 403),
            (NodeError::ExternalAnchor("down".into()), 502),
            (NodeError::NotReady { endpoint: "http://x".into() }, 503),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status().as_u16(), expected);
        }
    }
}

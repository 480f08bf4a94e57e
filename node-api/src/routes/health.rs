use axum::{Json, extract::State};

use notary_chain::HealthReport;

use crate::state::SharedState;

/// `GET /health`
///
/// Liveness plus chain length, pending pool size and peer count.
pub async fn health(State(node): State<SharedState>) -> Json<HealthReport> {
    Json(node.health().await)
}

use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the store and report whether it answers, along with the lifecycle position.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let snapshot = state.snapshot().await;
    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(&snapshot),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(&snapshot)
        }
    }
}

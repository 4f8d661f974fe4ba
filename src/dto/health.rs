use serde::Serialize;
use utoipa::ToSchema;

use crate::{dto::phase::VisiblePhase, state::Snapshot};

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Lifecycle phase currently held in memory.
    pub state: VisiblePhase,
    /// Number of transitions applied since startup.
    pub transitions: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(snapshot: &Snapshot) -> Self {
        Self::with_status("ok", snapshot)
    }

    /// Create a health response indicating the store cannot be reached.
    pub fn degraded(snapshot: &Snapshot) -> Self {
        Self::with_status("degraded", snapshot)
    }

    fn with_status(status: &str, snapshot: &Snapshot) -> Self {
        Self {
            status: status.to_string(),
            state: snapshot.phase.into(),
            transitions: snapshot.version,
        }
    }
}

use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of divisions currently held in the in-memory snapshot.
    pub cached_divisions: usize,
}

impl HealthResponse {
    pub fn ok(cached_divisions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            cached_divisions,
        }
    }

    /// Storage is unreachable; reads are served from the snapshot and writes are refused.
    pub fn degraded(cached_divisions: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            cached_divisions,
        }
    }
}

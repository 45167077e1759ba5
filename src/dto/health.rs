use serde::Serialize;
use utoipa::ToSchema;

/// Overall service health.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Whether the last storage ping succeeded.
    pub storage_reachable: bool,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
            storage_reachable: true,
        }
    }

    pub fn degraded(storage_reachable: bool) -> Self {
        Self {
            status: HealthStatus::Degraded,
            storage_reachable,
        }
    }
}

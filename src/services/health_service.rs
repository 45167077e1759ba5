use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the API is serving normally and whether storage answers right now.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let reachable = match state.store().await {
        Some(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                false
            }
        },
        None => {
            warn!("no storage installed (degraded mode)");
            false
        }
    };

    if state.is_degraded() || !reachable {
        HealthResponse::degraded(reachable)
    } else {
        HealthResponse::ok()
    }
}

use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

/// Liveness check; always answers 200 and reports storage state in the body.
#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "`ok`, or `degraded` while storage is unavailable", body = HealthResponse))
)]
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(health_service::health_status(&state).await)
}

pub fn router() -> Router<SharedState> {
    Router::new().route("/healthcheck", get(healthcheck))
}

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::SharedState;

pub mod auth;
pub mod docs;
pub mod extract;
pub mod games;
pub mod health;
pub mod social;
pub mod user;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(user::router())
        .merge(social::router())
        .merge(games::router())
        .merge(docs::router())
        .with_state(state)
}

/// [`router`] with the cross-cutting CORS and request tracing layers.
pub fn app(state: SharedState) -> Router<()> {
    router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

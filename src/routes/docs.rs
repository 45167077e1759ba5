use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Swagger UI at `/docs`, backed by the generated OpenAPI document.
pub fn router() -> Router<SharedState> {
    SwaggerUi::new("/docs").url(OPENAPI_PATH, ApiDoc::openapi()).into()
}

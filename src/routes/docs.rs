use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Serve the Swagger UI at `/docs` and the raw document next to it.
pub fn router() -> Router<SharedState> {
    Router::new().merge(SwaggerUi::new("/docs").url(OPENAPI_PATH, ApiDoc::openapi()))
}

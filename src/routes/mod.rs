use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Health check endpoint.
pub mod health;
/// Player intents.
pub mod session;
/// Presentation event stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(session::router())
        .merge(docs::router())
        .with_state(state)
}

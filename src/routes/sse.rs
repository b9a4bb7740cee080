use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/events",
    tag = "sse",
    responses((status = 200, description = "Session event stream", content_type = "text/event-stream", body = String))
)]
/// Stream board refreshes, messages and guess animations to the presentation layer.
pub async fn session_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, handshake) = sse_service::subscribe(&state).await?;
    info!(
        subscribers = state.events().subscriber_count(),
        "New session SSE connection"
    );
    Ok(sse_service::to_sse_stream(receiver, handshake))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/events", get(session_stream))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Hiburim Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::session_stream,
        crate::routes::session::current_session,
        crate::routes::session::select_word,
        crate::routes::session::deselect_all,
        crate::routes::session::shuffle,
        crate::routes::session::submit_guess,
        crate::routes::session::next_puzzle,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::SessionView,
            crate::dto::session::VisiblePhase,
            crate::dto::session::CategoryView,
            crate::dto::session::SelectRequest,
            crate::dto::session::SelectResponse,
            crate::dto::session::SubmitStatus,
            crate::dto::session::SubmitResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::MessageEvent,
            crate::dto::sse::MessageKind,
            crate::dto::sse::GuessPendingEvent,
            crate::dto::sse::GuessGradedEvent,
            crate::dto::sse::GuessAnimationEvent,
            crate::dto::sse::AnimationStage,
            crate::state::puzzle::Difficulty,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "session", description = "Player intents for the daily puzzle"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_session_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/session/submit"));
        assert!(doc.paths.paths.contains_key("/sse/events"));
    }
}

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::session::{SelectRequest, SelectResponse, SessionView, SubmitResponse},
    error::{AppError, ServiceError},
    state::SharedState,
};

/// Routes forwarding player intents to the session task.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(current_session))
        .route("/session/select", post(select_word))
        .route("/session/deselect", post(deselect_all))
        .route("/session/shuffle", post(shuffle))
        .route("/session/submit", post(submit_guess))
        .route("/session/next", post(next_puzzle))
}

/// Return the board as it currently stands.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Current board", body = SessionView)
    )
)]
pub async fn current_session(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.session().view().await?))
}

/// Toggle one word in the selection.
#[utoipa::path(
    post,
    path = "/session/select",
    tag = "session",
    request_body = SelectRequest,
    responses(
        (status = 200, description = "Selection updated", body = SelectResponse),
        (status = 400, description = "Malformed word")
    )
)]
pub async fn select_word(
    State(state): State<SharedState>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<SelectResponse>, AppError> {
    payload.validate()?;
    if payload.word.trim().is_empty() {
        return Err(ServiceError::InvalidInput("word must not be blank".into()).into());
    }
    Ok(Json(state.session().select(payload.word).await?))
}

/// Clear the selection.
#[utoipa::path(
    post,
    path = "/session/deselect",
    tag = "session",
    responses(
        (status = 200, description = "Selection cleared", body = SessionView)
    )
)]
pub async fn deselect_all(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.session().deselect_all().await?))
}

/// Reorder the remaining tiles.
#[utoipa::path(
    post,
    path = "/session/shuffle",
    tag = "session",
    responses(
        (status = 200, description = "Board reordered", body = SessionView)
    )
)]
pub async fn shuffle(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.session().shuffle().await?))
}

/// Submit the four selected words as a guess.
///
/// The verdict is delivered on the event stream once the guess is paced through.
#[utoipa::path(
    post,
    path = "/session/submit",
    tag = "session",
    responses(
        (status = 200, description = "What happened to the guess", body = SubmitResponse)
    )
)]
pub async fn submit_guess(
    State(state): State<SharedState>,
) -> Result<Json<SubmitResponse>, AppError> {
    let status = state.session().submit().await?;
    Ok(Json(SubmitResponse { status }))
}

/// Abandon the current puzzle and play the next catalog entry.
#[utoipa::path(
    post,
    path = "/session/next",
    tag = "session",
    responses(
        (status = 200, description = "Fresh board", body = SessionView),
        (status = 404, description = "Catalog is empty")
    )
)]
pub async fn next_puzzle(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.session().next_puzzle().await?))
}

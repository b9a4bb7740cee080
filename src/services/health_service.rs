use tracing::warn;

use crate::{
    dto::{health::HealthResponse, session::VisiblePhase},
    state::SharedState,
};

/// Report whether a puzzle is being served today.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.session().view().await {
        Ok(view) if view.phase != VisiblePhase::Unavailable => HealthResponse::ok(),
        Ok(view) => {
            warn!(date = %view.date, "no puzzle available (degraded mode)");
            HealthResponse::degraded()
        }
        Err(err) => {
            warn!(error = %err, "session runtime unreachable");
            HealthResponse::degraded()
        }
    }
}

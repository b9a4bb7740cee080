/// Validated puzzle catalog and day lookup.
pub mod catalog;
/// Puzzle model.
pub mod puzzle;
mod sse;
/// Pure session state machine.
pub mod state_machine;

use std::sync::Arc;

use crate::services::session_runtime::SessionHandle;

pub use self::sse::SseHub;
pub use self::state_machine::{PlanId, Session, SessionPhase};

/// Shared handle on the application state.
pub type SharedState = Arc<AppState>;

/// Capacity of the broadcast channel feeding SSE subscribers.
pub const EVENT_CAPACITY: usize = 64;

/// Central application state shared by every route handler.
pub struct AppState {
    session: SessionHandle,
    events: Arc<SseHub>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(session: SessionHandle, events: Arc<SseHub>) -> SharedState {
        Arc::new(Self { session, events })
    }

    /// Handle to the task owning the day's session.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Broadcast hub used for the presentation event stream.
    pub fn events(&self) -> &SseHub {
        &self.events
    }
}

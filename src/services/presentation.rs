//! Events pushed from the session core to the presentation layer.

use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        session::{SessionView, VisiblePhase},
        sse::{
            GuessAnimationEvent, GuessGradedEvent, GuessPendingEvent, MessageEvent, MessageKind,
            ServerEvent,
        },
    },
    state::SseHub,
};

const EVENT_REFRESH: &str = "session.refresh";
const EVENT_MESSAGE: &str = "session.message";
const EVENT_LOCK: &str = "session.lock";
const EVENT_GUESS_PENDING: &str = "guess.pending";
const EVENT_GUESS_GRADED: &str = "guess.graded";
const EVENT_GUESS_ANIMATION: &str = "guess.animation";

/// Shown after a correct guess.
pub const TEXT_CORRECT: &str = "Correct!";
/// Shown after a wrong guess.
pub const TEXT_WRONG: &str = "Not quite! Try again.";
/// Shown when three of the four words belong together.
pub const TEXT_ONE_AWAY: &str = "One away...";
/// Shown when a combination is submitted twice.
pub const TEXT_DUPLICATE: &str = "Already tried this combination.";
/// Shown once every category is found.
pub const TEXT_SOLVED: &str = "🎉 Congratulations! You solved the puzzle!";
/// Shown once the mistake budget runs out.
pub const TEXT_FAILED: &str = "Better luck tomorrow! Here’s the solution.";
/// Shown when no puzzle is published for the day.
pub const TEXT_NO_PUZZLE: &str = "No puzzles loaded.";

/// Notification emitted by the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEvent {
    /// The board changed and must be redrawn.
    Refresh(SessionView),
    /// Show a message to the player.
    Message(MessageEvent),
    /// The session reached a terminal phase; disable every control.
    LockUi(VisiblePhase),
    /// A guess is being considered.
    GuessPending(GuessPendingEvent),
    /// A guess has been graded and its animation may start.
    GuessGraded(GuessGradedEvent),
    /// A pacing step of the correct-guess animation elapsed.
    GuessAnimation(GuessAnimationEvent),
}

impl PresentationEvent {
    /// Build a message event.
    pub fn message(text: &str, kind: MessageKind, duration: Option<Duration>) -> Self {
        PresentationEvent::Message(MessageEvent {
            text: text.to_string(),
            kind,
            duration_ms: duration.map(|d| d.as_millis() as u64),
        })
    }

    /// Name of the SSE event carrying this notification.
    pub fn name(&self) -> &'static str {
        match self {
            PresentationEvent::Refresh(_) => EVENT_REFRESH,
            PresentationEvent::Message(_) => EVENT_MESSAGE,
            PresentationEvent::LockUi(_) => EVENT_LOCK,
            PresentationEvent::GuessPending(_) => EVENT_GUESS_PENDING,
            PresentationEvent::GuessGraded(_) => EVENT_GUESS_GRADED,
            PresentationEvent::GuessAnimation(_) => EVENT_GUESS_ANIMATION,
        }
    }

    /// Serialise into an SSE frame.
    pub fn to_server_event(&self) -> serde_json::Result<ServerEvent> {
        let name = Some(self.name().to_string());
        match self {
            PresentationEvent::Refresh(view) => ServerEvent::json(name, view),
            PresentationEvent::Message(message) => ServerEvent::json(name, message),
            PresentationEvent::LockUi(phase) => ServerEvent::json(name, &LockPayload { phase: *phase }),
            PresentationEvent::GuessPending(payload) => ServerEvent::json(name, payload),
            PresentationEvent::GuessGraded(payload) => ServerEvent::json(name, payload),
            PresentationEvent::GuessAnimation(payload) => ServerEvent::json(name, payload),
        }
    }
}

#[derive(Serialize)]
struct LockPayload {
    phase: VisiblePhase,
}

/// Sink receiving presentation events.
pub trait Presenter: Send + Sync {
    /// Deliver one event; delivery failures are the sink's concern.
    fn present(&self, event: PresentationEvent);
}

impl Presenter for SseHub {
    fn present(&self, event: PresentationEvent) {
        match event.to_server_event() {
            Ok(frame) => self.broadcast(frame),
            Err(err) => warn!(event = event.name(), error = %err, "failed to serialize presentation event"),
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Presenter keeping every event for later inspection.
    #[derive(Clone, Default)]
    pub struct RecordingPresenter {
        events: Arc<Mutex<Vec<PresentationEvent>>>,
    }

    impl RecordingPresenter {
        pub fn take(&self) -> Vec<PresentationEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }

        pub fn messages(&self) -> Vec<String> {
            self.take()
                .into_iter()
                .filter_map(|event| match event {
                    PresentationEvent::Message(message) => Some(message.text),
                    _ => None,
                })
                .collect()
        }
    }

    impl Presenter for RecordingPresenter {
        fn present(&self, event: PresentationEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_frames_carry_duration() {
        let event =
            PresentationEvent::message(TEXT_DUPLICATE, MessageKind::Incorrect, Some(Duration::from_millis(1500)));
        let frame = event.to_server_event().unwrap();

        assert_eq!(frame.event.as_deref(), Some("session.message"));
        let data: serde_json::Value = serde_json::from_str(&frame.data).unwrap();
        assert_eq!(data["kind"], "incorrect");
        assert_eq!(data["duration_ms"], 1500);
    }

    #[test]
    fn sse_hub_forwards_frames() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();
        hub.present(PresentationEvent::LockUi(VisiblePhase::Solved));

        let frame = receiver.try_recv().unwrap();
        assert_eq!(frame.event.as_deref(), Some("session.lock"));
        assert_eq!(frame.data, r#"{"phase":"solved"}"#);
    }
}

use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::session::{CategoryView, SessionView};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name; `None` falls back to the default `message` event.
    pub event: Option<String>,
    /// JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Current board so the client can draw immediately.
    pub session: SessionView,
}

/// Tone of a player-facing message.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Good news, shown in green.
    Correct,
    /// Mistakes and losses.
    Incorrect,
    /// Neutral notice.
    Info,
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
/// Text to show to the player.
pub struct MessageEvent {
    /// Message body.
    pub text: String,
    /// Tone used to style the message.
    pub kind: MessageKind,
    /// How long the message stays up; absent means until replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
/// Broadcast when a guess starts being considered.
pub struct GuessPendingEvent {
    /// The four submitted words.
    pub words: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
/// Broadcast once a guess has been graded, before it is applied.
pub struct GuessGradedEvent {
    /// Whether the guess matched a category.
    pub correct: bool,
    /// The four submitted words.
    pub words: Vec<String>,
    /// Category revealed by a correct guess.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryView>,
    /// Three of the four words share a category.
    pub one_away: bool,
}

/// Step of the correct-guess animation.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStage {
    /// Tiles stop hopping.
    Settle,
    /// Tiles dissolve into the solved row.
    Dissolve,
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
/// Broadcast at each pacing step of a correct guess.
pub struct GuessAnimationEvent {
    /// Step that just elapsed.
    pub stage: AnimationStage,
    /// Tiles being animated.
    pub words: Vec<String>,
}

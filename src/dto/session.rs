//! Wire types exchanged with the presentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::{
    puzzle::{Difficulty, SolvedCategory},
    state_machine::SessionPhase,
};

/// Publicly visible session phase.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// No puzzle is published for today.
    Unavailable,
    /// Guesses are accepted.
    Playing,
    /// The puzzle was solved.
    Solved,
    /// The mistake budget ran out; the solution is shown.
    Failed,
}

impl From<SessionPhase> for VisiblePhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Playing => VisiblePhase::Playing,
            SessionPhase::Solved => VisiblePhase::Solved,
            SessionPhase::Failed => VisiblePhase::Failed,
        }
    }
}

/// Category shown in the solved area.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct CategoryView {
    /// Theme of the category.
    pub name: String,
    /// The four member words.
    pub words: Vec<String>,
    /// Difficulty colour.
    pub difficulty: Difficulty,
}

impl From<&SolvedCategory> for CategoryView {
    fn from(value: &SolvedCategory) -> Self {
        Self {
            name: value.name.clone(),
            words: value.words.clone(),
            difficulty: value.difficulty,
        }
    }
}

/// Everything the presentation layer needs to draw the board.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Day being played, `DD.MM.YYYY`.
    pub date: String,
    /// Identifier of the active puzzle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puzzle_id: Option<String>,
    /// Current phase of play.
    pub phase: VisiblePhase,
    /// Wrong guesses so far.
    pub mistakes: u8,
    /// Wrong guesses left before the puzzle is lost.
    pub mistakes_remaining: u8,
    /// Selected words, in selection order.
    pub selected: Vec<String>,
    /// Unsolved words, in display order.
    pub remaining: Vec<String>,
    /// Found categories, or the full solution once failed.
    pub solved: Vec<CategoryView>,
    /// Whether the submit action should be enabled.
    pub submit_enabled: bool,
    /// Whether a guess is still being resolved.
    pub guess_pending: bool,
    /// Lifetime number of solved puzzles.
    pub trophies: u32,
}

/// Request to toggle a word in the selection.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SelectRequest {
    /// Word to toggle.
    #[validate(length(min = 1, max = 64))]
    pub word: String,
}

/// Selection size after a toggle.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct SelectResponse {
    /// Number of selected words.
    pub selected: usize,
    /// Whether the submit action should be enabled.
    pub submit_enabled: bool,
}

/// What happened to a submitted guess.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    /// Selection incomplete, session finished or unavailable.
    Ignored,
    /// Combination already graded this session.
    Duplicate,
    /// A previous guess is still being resolved.
    InFlight,
    /// Guess accepted; the result arrives on the event stream.
    Pending,
}

/// Response to a submit intent.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct SubmitResponse {
    /// Outcome of the intent.
    pub status: SubmitStatus,
}

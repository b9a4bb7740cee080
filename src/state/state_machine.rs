use std::{collections::HashSet, sync::Arc};

use rand::{Rng, seq::SliceRandom};
use thiserror::Error;
use uuid::Uuid;

use crate::state::puzzle::{
    BOARD_SIZE, Category, Puzzle, SolvedCategory, WORDS_PER_CATEGORY, WordTile, fold,
};

/// Mistakes allowed before the puzzle is failed.
pub const MAX_MISTAKES: u8 = 4;
/// Number of words a guess is made of.
pub const GUESS_SIZE: usize = WORDS_PER_CATEGORY;
/// Overlap at which the player is told they are one word away.
pub const ONE_AWAY_OVERLAP: usize = GUESS_SIZE - 1;

/// High-level phases a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Guesses are accepted.
    Playing,
    /// Every category was found. Terminal.
    Solved,
    /// The mistake budget ran out. Terminal.
    Failed,
}

impl SessionPhase {
    /// Whether the session is frozen.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionPhase::Playing)
    }
}

/// Unique identifier for a submitted guess awaiting resolution.
pub type PlanId = Uuid;

/// A submitted guess that has been validated and de-duplicated but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessPlan {
    /// Unique identifier for this guess.
    pub id: PlanId,
    /// The four words under consideration, in selection order.
    pub words: Vec<String>,
    /// Order-independent encoding of `words`.
    pub combo_key: String,
}

/// Result of asking the session to take a guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Selection incomplete or session terminal; nothing happened.
    Ignored,
    /// The same combination was already graded this session.
    Duplicate,
    /// Another guess is still being resolved.
    InFlight,
    /// The guess was accepted and awaits grading.
    Planned(GuessPlan),
}

/// How a guess compares to the hidden categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The guess is exactly one category.
    Correct(Category),
    /// The guess matches no category.
    Wrong {
        /// Largest number of guessed words sharing one category.
        max_overlap: usize,
    },
}

impl Verdict {
    /// Whether a wrong guess missed by a single word.
    pub fn is_one_away(&self) -> bool {
        matches!(self, Verdict::Wrong { max_overlap } if *max_overlap == ONE_AWAY_OVERLAP)
    }
}

/// Outcome of applying a graded guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Verdict that was applied.
    pub verdict: Verdict,
    /// Phase after the mutation.
    pub phase: SessionPhase,
}

/// Errors that can occur when grading or applying a planned guess.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuessError {
    /// No guess is currently pending.
    #[error("no guess is pending")]
    NoPending,
    /// Plan ID does not match the pending guess.
    #[error("pending guess is {expected}, got {got}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Progress restored from a snapshot: everything but selection and tried combinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredProgress {
    /// Mistakes made so far.
    pub mistakes: u8,
    /// Categories found so far.
    pub solved: Vec<SolvedCategory>,
    /// Tiles still on the board, in display order.
    pub remaining: Vec<WordTile>,
}

/// State machine driving one player's attempt at one puzzle.
#[derive(Debug, Clone)]
pub struct Session {
    puzzle: Arc<Puzzle>,
    phase: SessionPhase,
    mistakes: u8,
    selected: Vec<String>,
    remaining: Vec<WordTile>,
    solved: Vec<SolvedCategory>,
    tried: HashSet<String>,
    pending: Option<GuessPlan>,
}

impl Session {
    /// Start a fresh session with the board shuffled by the thread-local generator.
    pub fn new(puzzle: Arc<Puzzle>) -> Self {
        Self::with_rng(puzzle, &mut rand::rng())
    }

    /// Start a fresh session with the board shuffled by `rng`.
    pub fn with_rng<R: Rng + ?Sized>(puzzle: Arc<Puzzle>, rng: &mut R) -> Self {
        let mut remaining = puzzle.tiles();
        remaining.shuffle(rng);
        Self {
            puzzle,
            phase: SessionPhase::Playing,
            mistakes: 0,
            selected: Vec::new(),
            remaining,
            solved: Vec::new(),
            tried: HashSet::new(),
            pending: None,
        }
    }

    /// Resume an unfinished session.
    ///
    /// Returns `None` when the snapshot does not describe a reachable, unfinished
    /// board for this puzzle, so the caller can start afresh instead.
    pub fn restore(puzzle: Arc<Puzzle>, progress: RestoredProgress) -> Option<Self> {
        let RestoredProgress {
            mistakes,
            solved,
            remaining,
        } = progress;

        if mistakes >= MAX_MISTAKES || remaining.is_empty() {
            return None;
        }
        if solved.len() * WORDS_PER_CATEGORY + remaining.len() != BOARD_SIZE {
            return None;
        }

        let mut placed = HashSet::with_capacity(BOARD_SIZE);
        for category in &solved {
            let known = puzzle
                .categories()
                .iter()
                .any(|candidate| candidate.name == category.name && candidate.matches(&category.words));
            if !known {
                return None;
            }
            placed.extend(category.words.iter().map(|w| fold(w)));
        }
        for tile in &remaining {
            puzzle.category_of(&tile.word)?;
            placed.insert(fold(&tile.word));
        }
        if placed.len() != BOARD_SIZE {
            return None;
        }

        Some(Self {
            puzzle,
            phase: SessionPhase::Playing,
            mistakes,
            selected: Vec::new(),
            remaining,
            solved,
            tried: HashSet::new(),
            pending: None,
        })
    }

    /// Rebuild a finished session from its final record.
    pub fn finished(
        puzzle: Arc<Puzzle>,
        phase: SessionPhase,
        solved: Vec<SolvedCategory>,
        mistakes: u8,
    ) -> Self {
        Self {
            puzzle,
            phase,
            mistakes: mistakes.min(MAX_MISTAKES),
            selected: Vec::new(),
            remaining: Vec::new(),
            solved,
            tried: HashSet::new(),
            pending: None,
        }
    }

    /// Puzzle being played.
    pub fn puzzle(&self) -> &Arc<Puzzle> {
        &self.puzzle
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Mistakes made so far.
    pub fn mistakes(&self) -> u8 {
        self.mistakes
    }

    /// Currently selected words, in selection order.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Tiles still on the board, in display order.
    pub fn remaining(&self) -> &[WordTile] {
        &self.remaining
    }

    /// Found categories, in discovery order (full solution once failed).
    pub fn solved(&self) -> &[SolvedCategory] {
        &self.solved
    }

    /// Guess awaiting resolution, if any.
    pub fn pending(&self) -> Option<&GuessPlan> {
        self.pending.as_ref()
    }

    /// Whether submitting now would start a grading.
    pub fn can_submit(&self) -> bool {
        self.phase == SessionPhase::Playing
            && self.pending.is_none()
            && self.selected.len() == GUESS_SIZE
    }

    /// Toggle `word` in the selection and return the selection size.
    ///
    /// Unknown words, terminal sessions and a fifth selection leave the
    /// selection untouched.
    pub fn select(&mut self, word: &str) -> usize {
        if self.phase.is_terminal() || !self.remaining.iter().any(|tile| tile.word == word) {
            return self.selected.len();
        }

        if let Some(index) = self.selected.iter().position(|w| w == word) {
            self.selected.remove(index);
        } else if self.selected.len() < GUESS_SIZE {
            self.selected.push(word.to_string());
        }
        self.selected.len()
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Reorder the remaining tiles. Only the display order changes.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.remaining.shuffle(rng);
        true
    }

    /// Take the current selection as a guess.
    ///
    /// Each distinct combination is graded at most once per session regardless of
    /// selection order; repeats yield [`SubmitOutcome::Duplicate`] without touching state.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.phase.is_terminal() || self.selected.len() != GUESS_SIZE {
            return SubmitOutcome::Ignored;
        }
        if self.pending.is_some() {
            return SubmitOutcome::InFlight;
        }

        let combo_key = combo_key(&self.selected);
        if !self.tried.insert(combo_key.clone()) {
            return SubmitOutcome::Duplicate;
        }

        let plan = GuessPlan {
            id: Uuid::new_v4(),
            words: self.selected.clone(),
            combo_key,
        };
        self.pending = Some(plan.clone());
        SubmitOutcome::Planned(plan)
    }

    /// Compute the verdict of the pending guess without applying it.
    pub fn grade(&self, plan_id: PlanId) -> Result<Verdict, GuessError> {
        let plan = self.pending_plan(plan_id)?;
        Ok(self.verdict_for(&plan.words))
    }

    /// Apply the pending guess and return the resulting phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<Resolution, GuessError> {
        self.pending_plan(plan_id)?;
        let Some(plan) = self.pending.take() else {
            return Err(GuessError::NoPending);
        };

        let verdict = self.verdict_for(&plan.words);
        match &verdict {
            Verdict::Correct(category) => {
                self.remaining.retain(|tile| !category.contains(&tile.word));
                self.solved.push(SolvedCategory::from(category));
                self.selected.clear();
                if self.remaining.is_empty() {
                    self.phase = SessionPhase::Solved;
                }
            }
            Verdict::Wrong { .. } => {
                self.mistakes += 1;
                if self.mistakes >= MAX_MISTAKES {
                    self.reveal_solution();
                }
            }
        }

        Ok(Resolution {
            verdict,
            phase: self.phase,
        })
    }

    fn pending_plan(&self, plan_id: PlanId) -> Result<&GuessPlan, GuessError> {
        let plan = self.pending.as_ref().ok_or(GuessError::NoPending)?;
        if plan.id != plan_id {
            return Err(GuessError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }
        Ok(plan)
    }

    fn verdict_for(&self, words: &[String]) -> Verdict {
        let categories = self.puzzle.categories();
        if let Some(category) = categories.iter().find(|category| category.matches(words)) {
            return Verdict::Correct(category.clone());
        }

        let max_overlap = categories
            .iter()
            .map(|category| category.overlap(words))
            .max()
            .unwrap_or(0);
        Verdict::Wrong { max_overlap }
    }

    fn reveal_solution(&mut self) {
        self.phase = SessionPhase::Failed;
        self.mistakes = MAX_MISTAKES;
        self.remaining.clear();
        self.selected.clear();
        self.solved = self.puzzle.solution();
    }
}

/// Order-independent encoding of a guess; case is preserved.
pub fn combo_key(words: &[String]) -> String {
    let mut sorted: Vec<&str> = words.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join("|")
}

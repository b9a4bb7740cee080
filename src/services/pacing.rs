//! Fixed delays shared with the presentation layer's animations.
//!
//! These only pace when results are revealed and applied; they carry no game logic.

use std::time::Duration;

const PRE_CHECK_MS: u64 = 150;
const CORRECT_HOP_MS: u64 = 250;
const PAUSE_AFTER_HOP_MS: u64 = 300;
const CORRECT_RESOLVE_MS: u64 = 500;
const CORRECT_READ_MS: u64 = 800;
const WRONG_JIGGLE_MS: u64 = 300;
const WRONG_READ_MS: u64 = 1_000;
const DUPLICATE_MESSAGE_MS: u64 = 1_500;

/// Delay between submitting a guess and revealing its grade.
pub const PRE_CHECK_DELAY: Duration = Duration::from_millis(PRE_CHECK_MS);
/// Length of the hop played on correctly guessed tiles.
pub const CORRECT_HOP_DURATION: Duration = Duration::from_millis(CORRECT_HOP_MS);
/// Delay from grading until correctly guessed tiles start dissolving.
pub const CORRECT_DISSOLVE_DELAY: Duration =
    Duration::from_millis(CORRECT_HOP_MS + PAUSE_AFTER_HOP_MS);
/// Delay from grading until a correct guess is applied.
pub const CORRECT_SEQUENCE: Duration = Duration::from_millis(
    CORRECT_HOP_MS + PAUSE_AFTER_HOP_MS + CORRECT_RESOLVE_MS + CORRECT_READ_MS,
);
/// Delay from grading until a wrong guess is applied.
pub const WRONG_SEQUENCE: Duration = Duration::from_millis(WRONG_JIGGLE_MS + WRONG_READ_MS);
/// How long the duplicate-guess notice stays visible.
pub const DUPLICATE_MESSAGE_DURATION: Duration = Duration::from_millis(DUPLICATE_MESSAGE_MS);
/// How often the runtime checks whether the calendar day changed.
pub const DAY_CHECK_INTERVAL: Duration = Duration::from_secs(30);

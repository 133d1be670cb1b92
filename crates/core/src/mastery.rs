//! Shared definition of "mastered".
//!
//! The tracker, the session categorizer and the level policy all read these
//! constants; nothing else decides mastery.

use crate::model::Outcome;

/// Progress at or above which an item counts as mastered.
pub const MASTERY_THRESHOLD: u8 = 2;

/// Upper bound of the progress counter.
pub const MAX_PROGRESS: u8 = 5;

/// Session boundaries a freshly mastered item is withheld before revision.
pub const MASTERY_COOLDOWN_SESSIONS: u32 = 3;

#[must_use]
pub fn is_mastered(progress: u8) -> bool {
    progress >= MASTERY_THRESHOLD
}

/// Applies one outcome to a progress value, saturating at `0..=MAX_PROGRESS`.
#[must_use]
pub fn next_progress(progress: u8, outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Correct => progress.saturating_add(1).min(MAX_PROGRESS),
        Outcome::Wrong => progress.saturating_sub(1),
    }
}

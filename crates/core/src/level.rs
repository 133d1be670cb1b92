use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mastery;
use crate::model::{CandidateItem, ItemId, ProgressTracker};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("complexity level must be between 1 and 10, got {provided}")]
    OutOfRange { provided: u8 },
}

//
// ─── COMPLEXITY LEVEL ──────────────────────────────────────────────────────────
//

/// Difficulty tier of an item within a subject (1 through 10).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ComplexityLevel(u8);

impl ComplexityLevel {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(MAX_COMPLEXITY_LEVEL);

    /// Creates a level, rejecting values outside `1..=10`.
    ///
    /// # Errors
    ///
    /// Returns `LevelError::OutOfRange` for 0 or anything above 10.
    pub fn new(value: u8) -> Result<Self, LevelError> {
        if (1..=MAX_COMPLEXITY_LEVEL).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LevelError::OutOfRange { provided: value })
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// The following level, saturating at the cap.
    #[must_use]
    pub fn next(self) -> Self {
        Self((self.0 + 1).min(MAX_COMPLEXITY_LEVEL))
    }

    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 == MAX_COMPLEXITY_LEVEL
    }
}

/// Highest level a subject can advance to.
pub const MAX_COMPLEXITY_LEVEL: u8 = 10;

impl Default for ComplexityLevel {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u8> for ComplexityLevel {
    type Error = LevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ComplexityLevel> for u8 {
    fn from(level: ComplexityLevel) -> Self {
        level.0
    }
}

impl fmt::Debug for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComplexityLevel({})", self.0)
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── PROGRESSION POLICY ────────────────────────────────────────────────────────
//

/// True iff there is at least one progress value and all of them are mastered.
#[must_use]
pub fn all_mastered(progress: impl IntoIterator<Item = u8>) -> bool {
    let mut any = false;
    for p in progress {
        if !mastery::is_mastered(p) {
            return false;
        }
        any = true;
    }
    any
}

/// Whether every item at the learner's current level is mastered.
///
/// Items without a tracker have never been practised and block progression.
/// An empty level never progresses. Moving the stored level forward is the
/// caller's job.
#[must_use]
pub fn should_progress_level(
    items_at_current_level: &[CandidateItem],
    trackers: &HashMap<ItemId, ProgressTracker>,
) -> bool {
    all_mastered(
        items_at_current_level
            .iter()
            .map(|item| trackers.get(&item.id).map_or(0, ProgressTracker::progress)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LearnerId, Subject};
    use crate::time::fixed_now;

    fn item(id: &str) -> CandidateItem {
        CandidateItem::new(
            ItemId::new(id).unwrap(),
            Subject::new("kannada").unwrap(),
            ComplexityLevel::MIN,
        )
    }

    fn mastered(id: &str) -> ProgressTracker {
        let mut t = ProgressTracker::new(ItemId::new(id).unwrap(), LearnerId::new("asha").unwrap());
        t.record_attempt(true, fixed_now());
        t.record_attempt(true, fixed_now());
        t
    }

    #[test]
    fn level_bounds() {
        assert!(ComplexityLevel::new(0).is_err());
        assert!(ComplexityLevel::new(11).is_err());
        assert_eq!(ComplexityLevel::new(10).unwrap(), ComplexityLevel::MAX);
        assert_eq!(ComplexityLevel::MIN.next().value(), 2);
        assert_eq!(ComplexityLevel::MAX.next(), ComplexityLevel::MAX);
        assert!(ComplexityLevel::MAX.is_max());
    }

    #[test]
    fn progresses_when_everything_is_mastered() {
        let items = vec![item("a"), item("b"), item("c")];
        let trackers: HashMap<_, _> = ["a", "b", "c"]
            .into_iter()
            .map(|id| (ItemId::new(id).unwrap(), mastered(id)))
            .collect();
        assert!(should_progress_level(&items, &trackers));
    }

    #[test]
    fn one_unmastered_item_blocks_progression() {
        let items = vec![item("a"), item("b")];
        let mut trackers: HashMap<_, _> = HashMap::new();
        trackers.insert(ItemId::new("a").unwrap(), mastered("a"));
        let mut b = ProgressTracker::new(ItemId::new("b").unwrap(), LearnerId::new("asha").unwrap());
        b.record_attempt(true, fixed_now());
        trackers.insert(ItemId::new("b").unwrap(), b);
        assert!(!should_progress_level(&items, &trackers));
    }

    #[test]
    fn untracked_item_blocks_progression() {
        let items = vec![item("a"), item("b")];
        let mut trackers = HashMap::new();
        trackers.insert(ItemId::new("a").unwrap(), mastered("a"));
        assert!(!should_progress_level(&items, &trackers));
    }

    #[test]
    fn empty_level_never_progresses() {
        assert!(!should_progress_level(&[], &HashMap::new()));
        assert!(!all_mastered(std::iter::empty()));
    }
}

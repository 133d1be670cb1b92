use chrono::{DateTime, Utc};

use crate::guidance::Guidance;
use crate::mastery::{self, MASTERY_COOLDOWN_SESSIONS};
use crate::model::{Attempt, ItemId, LearnerId, Outcome};

//
// ─── TRANSITIONS & STATES ──────────────────────────────────────────────────────
//

/// Emitted by `ProgressTracker::record_attempt` when mastered status flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasteryTransition {
    /// Progress crossed the threshold upward; cooldown was reset to its full length.
    Achieved { at: DateTime<Utc> },
    /// Progress fell below the threshold; cooldown was cleared.
    Lost,
}

/// Coarse lifecycle state of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerState {
    /// No progress yet (fresh, or knocked back to zero).
    Unlearned,
    /// Some progress, below the mastery threshold.
    Struggling,
    /// Mastered and still withheld from sessions.
    MasteredCooldown,
    /// Mastered and eligible for revision.
    MasteredAvailable,
}

impl TrackerState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unlearned => "unlearned",
            Self::Struggling => "struggling",
            Self::MasteredCooldown => "mastered_cooldown",
            Self::MasteredAvailable => "mastered_available",
        }
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Learning history of one item for one learner.
///
/// Progress is a saturating counter in `0..=5`: a correct answer adds one,
/// a wrong answer takes one away. Crossing the mastery threshold upward
/// starts a cooldown of `MASTERY_COOLDOWN_SESSIONS` session boundaries;
/// crossing it downward clears the cooldown in the same update.
///
/// The tracker never validates timestamp order, so histories can be
/// replayed out of order.
///
/// # Examples
///
/// ```
/// # use practice_core::model::{ItemId, LearnerId, MasteryTransition, ProgressTracker};
/// # use practice_core::time::fixed_now;
/// let mut tracker = ProgressTracker::new(ItemId::new("ka")?, LearnerId::new("asha")?);
/// assert_eq!(tracker.record_attempt(true, fixed_now()), None);
/// assert!(matches!(
///     tracker.record_attempt(true, fixed_now()),
///     Some(MasteryTransition::Achieved { .. })
/// ));
/// assert_eq!(tracker.cooldown_sessions_left(), 3);
/// # Ok::<(), practice_core::model::IdError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTracker {
    item_id: ItemId,
    learner_id: LearnerId,
    progress: u8,
    attempts: Vec<Attempt>,
    cooldown_sessions_left: u32,
    mastery_achieved_at: Option<DateTime<Utc>>,
    reveal_count: u32,
}

impl ProgressTracker {
    /// Fresh tracker for the first contact between a learner and an item.
    #[must_use]
    pub fn new(item_id: ItemId, learner_id: LearnerId) -> Self {
        Self {
            item_id,
            learner_id,
            progress: 0,
            attempts: Vec::new(),
            cooldown_sessions_left: 0,
            mastery_achieved_at: None,
            reveal_count: 0,
        }
    }

    /// Rehydrate without validation; callers go through `from_snapshot`.
    pub(crate) fn from_parts(
        item_id: ItemId,
        learner_id: LearnerId,
        progress: u8,
        attempts: Vec<Attempt>,
        cooldown_sessions_left: u32,
        mastery_achieved_at: Option<DateTime<Utc>>,
        reveal_count: u32,
    ) -> Self {
        Self {
            item_id,
            learner_id,
            progress,
            attempts,
            cooldown_sessions_left,
            mastery_achieved_at,
            reveal_count,
        }
    }

    /// Record one answer and apply any mastery transition it causes.
    ///
    /// Returns `Some` only when mastered status flipped during this call.
    pub fn record_attempt(&mut self, correct: bool, at: DateTime<Utc>) -> Option<MasteryTransition> {
        let attempt = Attempt::new(Outcome::from_correct(correct), at);
        let was_mastered = self.is_mastered();

        self.progress = mastery::next_progress(self.progress, attempt.outcome());
        self.attempts.push(attempt);

        match (was_mastered, self.is_mastered()) {
            (false, true) => {
                self.cooldown_sessions_left = MASTERY_COOLDOWN_SESSIONS;
                self.mastery_achieved_at = Some(attempt.at());
                Some(MasteryTransition::Achieved { at: attempt.at() })
            }
            (true, false) => {
                self.cooldown_sessions_left = 0;
                self.mastery_achieved_at = None;
                Some(MasteryTransition::Lost)
            }
            _ => None,
        }
    }

    /// Count one "show me the answer" request.
    pub fn record_reveal(&mut self) {
        self.reveal_count = self.reveal_count.saturating_add(1);
    }

    /// One session boundary has passed.
    ///
    /// Returns `true` if the cooldown actually moved.
    pub fn decrement_cooldown(&mut self) -> bool {
        if self.is_mastered() && self.cooldown_sessions_left > 0 {
            self.cooldown_sessions_left -= 1;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    #[must_use]
    pub fn learner_id(&self) -> &LearnerId {
        &self.learner_id
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    #[must_use]
    pub fn wrong_attempts(&self) -> usize {
        self.attempts.iter().filter(|a| !a.is_correct()).count()
    }

    #[must_use]
    pub fn cooldown_sessions_left(&self) -> u32 {
        self.cooldown_sessions_left
    }

    #[must_use]
    pub fn mastery_achieved_at(&self) -> Option<DateTime<Utc>> {
        self.mastery_achieved_at
    }

    #[must_use]
    pub fn reveal_count(&self) -> u32 {
        self.reveal_count
    }

    /// Latest attempt timestamp, independent of insertion order.
    #[must_use]
    pub fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.attempts.iter().map(Attempt::at).max()
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        mastery::is_mastered(self.progress)
    }

    #[must_use]
    pub fn is_in_cooldown(&self) -> bool {
        self.is_mastered() && self.cooldown_sessions_left > 0
    }

    /// Mastered despite at least one wrong answer somewhere in the history.
    #[must_use]
    pub fn is_turnaround(&self) -> bool {
        self.is_mastered() && self.attempts.iter().any(|a| !a.is_correct())
    }

    #[must_use]
    pub fn state(&self) -> TrackerState {
        if self.is_mastered() {
            if self.cooldown_sessions_left > 0 {
                TrackerState::MasteredCooldown
            } else {
                TrackerState::MasteredAvailable
            }
        } else if self.progress == 0 {
            TrackerState::Unlearned
        } else {
            TrackerState::Struggling
        }
    }

    #[must_use]
    pub fn guidance(&self) -> Guidance {
        Guidance::for_tracker(self)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

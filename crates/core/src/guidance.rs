//! Short canned feedback derived from a tracker's state.
//!
//! Pure function of progress, attempt count/recency and reveal count. Any
//! caching or localization happens outside the core.

use serde::Serialize;

use crate::model::ProgressTracker;

/// Reveals at which an unmastered item is flagged as a struggle.
pub const STRUGGLING_REVEAL_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuidanceContext {
    Initial,
    FirstAttemptWrong,
    FirstSuccess,
    CorrectProgress,
    Mastered,
    Struggling,
    NeedsPractice,
}

impl GuidanceContext {
    /// Classify a tracker. First matching rule wins.
    #[must_use]
    pub fn classify(tracker: &ProgressTracker) -> Self {
        let attempts = tracker.attempts();
        let Some(last) = attempts.last() else {
            return Self::Initial;
        };

        if tracker.is_mastered() {
            return Self::Mastered;
        }
        if attempts.len() == 1 {
            return if last.is_correct() {
                Self::FirstSuccess
            } else {
                Self::FirstAttemptWrong
            };
        }
        if last.is_correct() {
            return Self::CorrectProgress;
        }

        let two_wrong_in_a_row = attempts.iter().rev().take(2).all(|a| !a.is_correct());
        if two_wrong_in_a_row || tracker.reveal_count() >= STRUGGLING_REVEAL_COUNT {
            Self::Struggling
        } else {
            Self::NeedsPractice
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::FirstAttemptWrong => "first-attempt-wrong",
            Self::FirstSuccess => "first-success",
            Self::CorrectProgress => "correct-progress",
            Self::Mastered => "mastered",
            Self::Struggling => "struggling",
            Self::NeedsPractice => "needs-practice",
        }
    }

    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::Initial | Self::FirstAttemptWrong => Severity::Info,
            Self::FirstSuccess | Self::CorrectProgress | Self::Mastered => Severity::Success,
            Self::Struggling | Self::NeedsPractice => Severity::Warning,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Initial => "Let's learn this one together!",
            Self::FirstAttemptWrong => {
                "That's okay! Every expert was once a beginner. Let's try again."
            }
            Self::FirstSuccess => "Great start! You got it right the first time!",
            Self::CorrectProgress => "Nice work! Keep going and you'll master this one.",
            Self::Mastered => "You've mastered this one! Amazing work!",
            Self::Struggling => "This one is tricky. Take your time and look closely.",
            Self::NeedsPractice => "Keep practicing, you're getting closer!",
        }
    }
}

/// Context tag, severity and message for one tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Guidance {
    pub context: GuidanceContext,
    pub severity: Severity,
    pub message: &'static str,
}

impl Guidance {
    #[must_use]
    pub fn for_tracker(tracker: &ProgressTracker) -> Self {
        Self::from_context(GuidanceContext::classify(tracker))
    }

    #[must_use]
    pub fn from_context(context: GuidanceContext) -> Self {
        Self {
            context,
            severity: context.severity(),
            message: context.message(),
        }
    }
}

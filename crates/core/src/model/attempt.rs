use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

//
// ─── OUTCOME ──────────────────────────────────────────────────────────────────
//

/// Result of a single practice attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Wrong,
}

impl Outcome {
    #[must_use]
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Wrong }
    }

    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Wrong => "wrong",
        }
    }
}

//
// ─── ATTEMPT ──────────────────────────────────────────────────────────────────
//

/// Immutable record of one practice outcome.
///
/// Timestamps are kept at millisecond precision, which is what the
/// persisted form carries, so a snapshot round-trip never changes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    at: DateTime<Utc>,
    outcome: Outcome,
}

impl Attempt {
    #[must_use]
    pub fn new(outcome: Outcome, at: DateTime<Utc>) -> Self {
        Self {
            at: at.trunc_subsecs(3),
            outcome,
        }
    }

    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.outcome.is_correct()
    }
}

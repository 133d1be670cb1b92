//! Learning statistics derived from full attempt histories.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use crate::mastery;
use crate::model::{ProgressTracker, Subject};

/// Figures for one scope (everything, or a single subject).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectStatistics {
    pub total_attempted: usize,
    pub total_mastered: usize,
    pub mastery_percentage: f64,
    pub average_attempts_to_mastery: f64,
    pub turnaround_count: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningStatistics {
    pub total_attempted: usize,
    pub total_mastered: usize,
    pub mastery_percentage: f64,
    pub average_attempts_to_mastery: f64,
    pub turnaround_count: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub per_subject: BTreeMap<Subject, SubjectStatistics>,
}

/// Buckets attempts into calendar days at a fixed offset (UTC by default).
#[derive(Debug, Clone, Copy)]
pub struct StatisticsAggregator {
    offset: FixedOffset,
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self { offset: Utc.fix() }
    }
}

impl StatisticsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self { offset }
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Aggregate every `(subject, tracker)` pair that has at least one attempt.
    ///
    /// `today` anchors the current streak and should be computed at the same
    /// offset as this aggregator.
    pub fn compute<'a, I>(&self, entries: I, today: NaiveDate) -> LearningStatistics
    where
        I: IntoIterator<Item = (&'a Subject, &'a ProgressTracker)>,
    {
        let mut overall = Tally::default();
        let mut by_subject: BTreeMap<Subject, Tally> = BTreeMap::new();

        for (subject, tracker) in entries {
            if tracker.attempts().is_empty() {
                continue;
            }
            overall.add(tracker, self.offset);
            by_subject
                .entry(subject.clone())
                .or_default()
                .add(tracker, self.offset);
        }

        let totals = overall.finish(today);
        LearningStatistics {
            total_attempted: totals.total_attempted,
            total_mastered: totals.total_mastered,
            mastery_percentage: totals.mastery_percentage,
            average_attempts_to_mastery: totals.average_attempts_to_mastery,
            turnaround_count: totals.turnaround_count,
            current_streak: totals.current_streak,
            longest_streak: totals.longest_streak,
            per_subject: by_subject
                .into_iter()
                .map(|(subject, tally)| (subject, tally.finish(today)))
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    attempted: usize,
    mastered: usize,
    turnarounds: usize,
    attempts_to_mastery: usize,
    days: BTreeSet<NaiveDate>,
}

impl Tally {
    fn add(&mut self, tracker: &ProgressTracker, offset: FixedOffset) {
        self.attempted += 1;
        if tracker.is_mastered() {
            self.mastered += 1;
            self.attempts_to_mastery += attempts_to_mastery(tracker);
        }
        if tracker.is_turnaround() {
            self.turnarounds += 1;
        }
        self.days.extend(
            tracker
                .attempts()
                .iter()
                .map(|a| a.at().with_timezone(&offset).date_naive()),
        );
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(&self, today: NaiveDate) -> SubjectStatistics {
        let mastery_percentage = if self.attempted == 0 {
            0.0
        } else {
            self.mastered as f64 / self.attempted as f64 * 100.0
        };
        let average_attempts_to_mastery = if self.mastered == 0 {
            0.0
        } else {
            self.attempts_to_mastery as f64 / self.mastered as f64
        };

        SubjectStatistics {
            total_attempted: self.attempted,
            total_mastered: self.mastered,
            mastery_percentage,
            average_attempts_to_mastery,
            turnaround_count: self.turnarounds,
            current_streak: current_streak(&self.days, today),
            longest_streak: longest_streak(&self.days),
        }
    }
}

/// Attempts up to and including the one that most recently crossed the
/// mastery threshold, found by replaying the outcomes from zero.
///
/// Falls back to the full history length when the replay never crosses,
/// which can happen for imported snapshots.
#[must_use]
pub fn attempts_to_mastery(tracker: &ProgressTracker) -> usize {
    let mut progress = 0;
    let mut crossed_at = None;
    for (i, attempt) in tracker.attempts().iter().enumerate() {
        let was_mastered = mastery::is_mastered(progress);
        progress = mastery::next_progress(progress, attempt.outcome());
        if !was_mastered && mastery::is_mastered(progress) {
            crossed_at = Some(i + 1);
        }
    }
    crossed_at.unwrap_or(tracker.attempts().len())
}

/// Consecutive practice days ending today, or yesterday if nothing yet today.
#[must_use]
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let anchor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    let mut day = Some(anchor);
    while let Some(d) = day.filter(|d| days.contains(d)) {
        streak += 1;
        day = d.pred_opt();
    }
    streak
}

/// Longest run of consecutive practice days anywhere in the history.
#[must_use]
pub fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &day in days {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(expected) if expected == day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

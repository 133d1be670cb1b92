//! Session composition: categorize a candidate pool, then assemble an
//! ordered, size-capped selection.

mod assemble;
mod categorize;

use std::collections::HashMap;

pub use assemble::{SessionAssembler, SessionComposition, SessionOptions, SessionType};
pub use categorize::{SessionBuckets, SessionCandidate, categorize, sort_by_priority};

use crate::level::ComplexityLevel;
use crate::model::{CandidateItem, ItemId, ProgressTracker, Subject};

/// Categorize `items` for one subject/level and assemble a session from them.
#[must_use]
pub fn compose_session(
    items: &[CandidateItem],
    subject: &Subject,
    level: ComplexityLevel,
    trackers: &HashMap<ItemId, ProgressTracker>,
    options: SessionOptions,
) -> SessionComposition {
    let buckets = categorize(items, subject, level, trackers);
    SessionAssembler::new(options).assemble(&buckets)
}

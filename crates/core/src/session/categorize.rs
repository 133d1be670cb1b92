use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::level::ComplexityLevel;
use crate::model::{CandidateItem, ItemId, ProgressTracker, Subject};

//
// ─── SESSION CANDIDATE ─────────────────────────────────────────────────────────
//

/// The slice of item + tracker data session composition depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCandidate {
    pub id: ItemId,
    pub progress: u8,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub display_text: String,
}

impl SessionCandidate {
    #[must_use]
    pub fn from_item(item: &CandidateItem, tracker: Option<&ProgressTracker>) -> Self {
        Self {
            id: item.id.clone(),
            progress: tracker.map_or(0, ProgressTracker::progress),
            last_attempt_at: tracker.and_then(ProgressTracker::last_attempt_at),
            display_text: item.display_text().to_owned(),
        }
    }

    /// Priority order: lowest progress first, then least recently practised
    /// (never-practised first), then display text, then id.
    #[must_use]
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        self.progress
            .cmp(&other.progress)
            .then_with(|| self.last_attempt_at.cmp(&other.last_attempt_at))
            .then_with(|| self.display_text.cmp(&other.display_text))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sorts candidates into session priority order.
pub fn sort_by_priority(candidates: &mut [SessionCandidate]) {
    candidates.sort_by(SessionCandidate::priority_cmp);
}

//
// ─── BUCKETS ───────────────────────────────────────────────────────────────────
//

/// Disjoint partition of one subject/level pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBuckets {
    pub subject: Subject,
    pub level: ComplexityLevel,
    pub struggling: Vec<SessionCandidate>,
    pub new: Vec<SessionCandidate>,
    pub cooling_down: Vec<SessionCandidate>,
    pub revision_ready: Vec<SessionCandidate>,
}

impl SessionBuckets {
    #[must_use]
    pub fn empty(subject: Subject, level: ComplexityLevel) -> Self {
        Self {
            subject,
            level,
            struggling: Vec::new(),
            new: Vec::new(),
            cooling_down: Vec::new(),
            revision_ready: Vec::new(),
        }
    }

    /// Size of the filtered pool, cooling-down items included.
    #[must_use]
    pub fn total_available(&self) -> usize {
        self.struggling.len() + self.new.len() + self.cooling_down.len() + self.revision_ready.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_available() == 0
    }
}

/// Partition the catalog items of one subject and level by learning state.
///
/// Items of other subjects or levels are ignored, as are repeated ids after
/// their first occurrence. An item without a tracker is new.
#[must_use]
pub fn categorize(
    items: &[CandidateItem],
    subject: &Subject,
    level: ComplexityLevel,
    trackers: &HashMap<ItemId, ProgressTracker>,
) -> SessionBuckets {
    let mut buckets = SessionBuckets::empty(subject.clone(), level);
    let mut seen = HashSet::new();

    for item in items.iter().filter(|i| i.belongs_to(subject, level)) {
        if !seen.insert(&item.id) {
            continue;
        }
        let tracker = trackers.get(&item.id);
        let candidate = SessionCandidate::from_item(item, tracker);

        let bucket = match tracker {
            Some(t) if t.is_in_cooldown() => &mut buckets.cooling_down,
            Some(t) if t.is_mastered() => &mut buckets.revision_ready,
            Some(t) if t.progress() > 0 => &mut buckets.struggling,
            _ => &mut buckets.new,
        };
        bucket.push(candidate);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LearnerId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn kannada() -> Subject {
        Subject::new("kannada").unwrap()
    }

    fn item(id: &str) -> CandidateItem {
        CandidateItem::new(ItemId::new(id).unwrap(), kannada(), ComplexityLevel::MIN)
    }

    fn tracker(id: &str, outcomes: &[bool]) -> ProgressTracker {
        let mut t = ProgressTracker::new(ItemId::new(id).unwrap(), LearnerId::new("asha").unwrap());
        for correct in outcomes {
            t.record_attempt(*correct, fixed_now());
        }
        t
    }

    fn ids(candidates: &[SessionCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn partitions_into_four_buckets() {
        let items = vec![item("new"), item("zero"), item("strug"), item("cool"), item("ready")];
        let mut trackers = HashMap::new();
        trackers.insert(ItemId::new("zero").unwrap(), tracker("zero", &[false]));
        trackers.insert(ItemId::new("strug").unwrap(), tracker("strug", &[true]));
        trackers.insert(ItemId::new("cool").unwrap(), tracker("cool", &[true, true]));
        let mut ready = tracker("ready", &[true, true]);
        for _ in 0..3 {
            ready.decrement_cooldown();
        }
        trackers.insert(ItemId::new("ready").unwrap(), ready);

        let buckets = categorize(&items, &kannada(), ComplexityLevel::MIN, &trackers);

        assert_eq!(ids(&buckets.new), vec!["new", "zero"]);
        assert_eq!(ids(&buckets.struggling), vec!["strug"]);
        assert_eq!(ids(&buckets.cooling_down), vec!["cool"]);
        assert_eq!(ids(&buckets.revision_ready), vec!["ready"]);
        assert_eq!(buckets.total_available(), 5);
    }

    #[test]
    fn filters_other_subjects_and_levels() {
        let items = vec![
            item("a"),
            CandidateItem::new(ItemId::new("b").unwrap(), Subject::new("math").unwrap(), ComplexityLevel::MIN),
            CandidateItem::new(ItemId::new("c").unwrap(), kannada(), ComplexityLevel::new(2).unwrap()),
        ];
        let buckets = categorize(&items, &kannada(), ComplexityLevel::MIN, &HashMap::new());
        assert_eq!(ids(&buckets.new), vec!["a"]);
        assert_eq!(buckets.total_available(), 1);
    }

    #[test]
    fn empty_pool_gives_empty_buckets() {
        let buckets = categorize(&[], &kannada(), ComplexityLevel::MIN, &HashMap::new());
        assert!(buckets.is_empty());
        assert_eq!(buckets, SessionBuckets::empty(kannada(), ComplexityLevel::MIN));
    }

    #[test]
    fn duplicate_catalog_entries_count_once() {
        let items = vec![item("a"), item("a")];
        let buckets = categorize(&items, &kannada(), ComplexityLevel::MIN, &HashMap::new());
        assert_eq!(buckets.total_available(), 1);
    }

    #[test]
    fn priority_orders_progress_then_recency_then_text() {
        let now = fixed_now();
        let candidate = |id: &str, progress, last: Option<i64>, text: &str| SessionCandidate {
            id: ItemId::new(id).unwrap(),
            progress,
            last_attempt_at: last.map(|m| now + Duration::minutes(m)),
            display_text: text.to_owned(),
        };
        let mut list = vec![
            candidate("e", 1, Some(5), "e"),
            candidate("d", 1, Some(1), "d"),
            candidate("c", 0, Some(9), "c"),
            candidate("b", 0, None, "zz"),
            candidate("a", 0, None, "aa"),
        ];
        sort_by_priority(&mut list);
        assert_eq!(ids(&list), vec!["a", "b", "c", "d", "e"]);
    }
}

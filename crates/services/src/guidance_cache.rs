//! Bounded memo of guidance per tracker state.

use std::num::NonZeroUsize;

use lru::LruCache;
use practice_core::guidance::Guidance;
use practice_core::model::{ItemId, LearnerId, Outcome, ProgressTracker};
use tracing::debug;

/// Learner, item, and every tracker input that guidance classification reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    learner: LearnerId,
    item: ItemId,
    attempt_count: usize,
    reveal_count: u32,
    progress: u8,
    recent: [Option<Outcome>; 2],
}

impl CacheKey {
    fn of(tracker: &ProgressTracker) -> Self {
        let mut recent = tracker.attempts().iter().rev().map(|a| a.outcome());
        Self {
            learner: tracker.learner_id().clone(),
            item: tracker.item_id().clone(),
            attempt_count: tracker.attempt_count(),
            reveal_count: tracker.reveal_count(),
            progress: tracker.progress(),
            recent: [recent.next(), recent.next()],
        }
    }
}

/// LRU cache of `Guidance` per learner, item and tracker state.
///
/// A reset item that reaches the same attempt count again with a different
/// history gets a different key.
pub struct GuidanceCache {
    entries: LruCache<CacheKey, Guidance>,
}

impl GuidanceCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Guidance for `tracker`, computed once per distinct state.
    pub fn guidance_for(&mut self, tracker: &ProgressTracker) -> Guidance {
        let key = CacheKey::of(tracker);
        if let Some(hit) = self.entries.get(&key) {
            debug!(
                learner = %tracker.learner_id(),
                item = %tracker.item_id(),
                "guidance cache hit"
            );
            return *hit;
        }
        let guidance = tracker.guidance();
        self.entries.put(key, guidance);
        guidance
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.cap()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

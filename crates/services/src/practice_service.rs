use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use practice_core::{
    Clock,
    guidance::Guidance,
    level::{ComplexityLevel, should_progress_level},
    model::{
        CandidateItem, ItemId, LearnerId, MasteryTransition, ProgressTracker, Subject,
        TrackerSnapshot,
    },
    session::{SessionComposition, compose_session},
    stats::{LearningStatistics, StatisticsAggregator},
};
use storage::repository::{Storage, StorageError};

use crate::error::PracticeError;
use crate::guidance_cache::GuidanceCache;
use crate::settings::PracticeSettings;

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Result of recording one answer: the persisted tracker, any mastery change,
/// and the feedback to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub tracker: ProgressTracker,
    pub transition: Option<MasteryTransition>,
    pub guidance: Guidance,
}

impl AnswerOutcome {
    #[must_use]
    pub fn mastered_now(&self) -> bool {
        matches!(self.transition, Some(MasteryTransition::Achieved { .. }))
    }
}

/// Outcome of a level progression check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelAdvance {
    Advanced {
        from: ComplexityLevel,
        to: ComplexityLevel,
    },
    Unchanged {
        level: ComplexityLevel,
    },
}

impl LevelAdvance {
    #[must_use]
    pub fn current(self) -> ComplexityLevel {
        match self {
            Self::Advanced { to, .. } => to,
            Self::Unchanged { level } => level,
        }
    }

    #[must_use]
    pub fn advanced(self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Runs the practice loop for learners: plans sessions, records answers and
/// reveals, ticks cooldowns, advances levels, and reports statistics.
pub struct PracticeService {
    clock: Clock,
    storage: Storage,
    settings: PracticeSettings,
    aggregator: StatisticsAggregator,
    guidance: Mutex<GuidanceCache>,
}

impl PracticeService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage, settings: PracticeSettings) -> Self {
        Self {
            clock,
            storage,
            settings,
            aggregator: StatisticsAggregator::default(),
            guidance: Mutex::new(GuidanceCache::new(settings.guidance_cache_capacity())),
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Override how statistics bucket attempts into days.
    #[must_use]
    pub fn with_aggregator(mut self, aggregator: StatisticsAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn settings(&self) -> PracticeSettings {
        self.settings
    }

    fn guidance_for(&self, tracker: &ProgressTracker) -> Guidance {
        match self.guidance.lock() {
            Ok(mut cache) => cache.guidance_for(tracker),
            Err(_) => tracker.guidance(),
        }
    }

    async fn load_or_new(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<ProgressTracker, StorageError> {
        Ok(self
            .storage
            .trackers
            .get_tracker(learner, item)
            .await?
            .unwrap_or_else(|| ProgressTracker::new(item.clone(), learner.clone())))
    }

    async fn tracker_map(
        &self,
        learner: &LearnerId,
    ) -> Result<HashMap<ItemId, ProgressTracker>, StorageError> {
        Ok(self
            .storage
            .trackers
            .trackers_for_learner(learner)
            .await?
            .into_iter()
            .map(|t| (t.item_id().clone(), t))
            .collect())
    }

    /// Choose what the learner practises next in `subject` at their stored level.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if trackers or the level cannot be loaded.
    pub async fn plan_session(
        &self,
        learner: &LearnerId,
        subject: &Subject,
        catalog: &[CandidateItem],
    ) -> Result<SessionComposition, PracticeError> {
        let level = self.storage.levels.get_level(learner, subject).await?;
        let trackers = self.tracker_map(learner).await?;

        let composition = compose_session(
            catalog,
            subject,
            level,
            &trackers,
            self.settings.session_options(),
        );

        info!(
            learner = %learner,
            subject = %subject,
            level = %level,
            selected = composition.total(),
            available = composition.total_available,
            session_type = composition.session_type.as_str(),
            "planned practice session"
        );
        Ok(composition)
    }

    /// Record one answer at the clock's current time and persist it.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if the tracker cannot be loaded or stored.
    pub async fn record_answer(
        &self,
        learner: &LearnerId,
        item: &ItemId,
        correct: bool,
    ) -> Result<AnswerOutcome, PracticeError> {
        let mut tracker = self.load_or_new(learner, item).await?;
        let transition = tracker.record_attempt(correct, self.clock.now());
        self.storage.trackers.upsert_tracker(&tracker).await?;

        match transition {
            Some(MasteryTransition::Achieved { at }) => {
                info!(learner = %learner, item = %item, at = %at, "mastery achieved");
            }
            Some(MasteryTransition::Lost) => {
                info!(learner = %learner, item = %item, "mastery lost");
            }
            None => {}
        }

        let guidance = self.guidance_for(&tracker);
        Ok(AnswerOutcome {
            tracker,
            transition,
            guidance,
        })
    }

    /// Count a "show me the answer" request and return the updated guidance.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if the tracker cannot be loaded or stored.
    pub async fn record_reveal(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<Guidance, PracticeError> {
        let mut tracker = self.load_or_new(learner, item).await?;
        tracker.record_reveal();
        self.storage.trackers.upsert_tracker(&tracker).await?;
        Ok(self.guidance_for(&tracker))
    }

    /// Current guidance for an item, `Initial` if it was never practised.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if the tracker cannot be loaded.
    pub async fn guidance(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<Guidance, PracticeError> {
        let tracker = self.load_or_new(learner, item).await?;
        Ok(self.guidance_for(&tracker))
    }

    /// Finish a session in `subject`: every mastered tracker of the learner
    /// whose item belongs to `subject` in `catalog` gets one cooldown tick,
    /// whether or not it was part of the session. Returns how many trackers
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if trackers cannot be loaded or stored.
    pub async fn complete_session(
        &self,
        learner: &LearnerId,
        subject: &Subject,
        catalog: &[CandidateItem],
    ) -> Result<usize, PracticeError> {
        let in_subject: HashSet<&ItemId> = catalog
            .iter()
            .filter(|item| &item.subject == subject)
            .map(|item| &item.id)
            .collect();
        let mut ticked = 0;

        for mut tracker in self.storage.trackers.trackers_for_learner(learner).await? {
            if !in_subject.contains(tracker.item_id()) || !tracker.decrement_cooldown() {
                continue;
            }
            self.storage.trackers.upsert_tracker(&tracker).await?;
            debug!(
                learner = %learner,
                item = %tracker.item_id(),
                remaining = tracker.cooldown_sessions_left(),
                "cooldown ticked"
            );
            ticked += 1;
        }
        Ok(ticked)
    }

    /// Stored level for `subject`, level 1 if none was stored yet.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if the level cannot be loaded.
    pub async fn current_level(
        &self,
        learner: &LearnerId,
        subject: &Subject,
    ) -> Result<ComplexityLevel, PracticeError> {
        Ok(self.storage.levels.get_level(learner, subject).await?)
    }

    /// Set the level explicitly, e.g. from a placement decision.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Level` if `level` is outside 1..=10 and
    /// `PracticeError::Storage` if it cannot be stored.
    pub async fn set_level(
        &self,
        learner: &LearnerId,
        subject: &Subject,
        level: u8,
    ) -> Result<ComplexityLevel, PracticeError> {
        let level = ComplexityLevel::new(level)?;
        self.storage.levels.set_level(learner, subject, level).await?;
        Ok(level)
    }

    /// Move to the next level once every item at the current one is mastered.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if trackers or the level cannot be
    /// loaded or stored.
    pub async fn advance_level_if_ready(
        &self,
        learner: &LearnerId,
        subject: &Subject,
        catalog: &[CandidateItem],
    ) -> Result<LevelAdvance, PracticeError> {
        let level = self.storage.levels.get_level(learner, subject).await?;
        let trackers = self.tracker_map(learner).await?;
        let at_level: Vec<CandidateItem> = catalog
            .iter()
            .filter(|item| item.belongs_to(subject, level))
            .cloned()
            .collect();

        if level.is_max() || !should_progress_level(&at_level, &trackers) {
            return Ok(LevelAdvance::Unchanged { level });
        }

        let next = level.next();
        self.storage.levels.set_level(learner, subject, next).await?;
        info!(
            learner = %learner,
            subject = %subject,
            from = %level,
            to = %next,
            "level advanced"
        );
        Ok(LevelAdvance::Advanced {
            from: level,
            to: next,
        })
    }

    /// Statistics over every practised item of `catalog`, with today taken
    /// from the clock.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if trackers cannot be loaded.
    pub async fn statistics(
        &self,
        learner: &LearnerId,
        catalog: &[CandidateItem],
    ) -> Result<LearningStatistics, PracticeError> {
        let trackers = self.storage.trackers.trackers_for_learner(learner).await?;
        let subjects: HashMap<&ItemId, &Subject> =
            catalog.iter().map(|item| (&item.id, &item.subject)).collect();

        let mut entries = Vec::with_capacity(trackers.len());
        for tracker in &trackers {
            match subjects.get(tracker.item_id()) {
                Some(subject) => entries.push((*subject, tracker)),
                None => warn!(
                    learner = %learner,
                    item = %tracker.item_id(),
                    "tracked item missing from catalog; left out of statistics"
                ),
            }
        }

        let today = self.clock.today(self.aggregator.offset());
        Ok(self.aggregator.compute(entries, today))
    }

    /// Forget all progress on one item.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::UnknownItem` if nothing was recorded for it.
    pub async fn reset_item(&self, learner: &LearnerId, item: &ItemId) -> Result<(), PracticeError> {
        match self.storage.trackers.delete_tracker(learner, item).await {
            Ok(()) => {
                info!(learner = %learner, item = %item, "item progress reset");
                Ok(())
            }
            Err(StorageError::NotFound) => Err(PracticeError::UnknownItem { item: item.clone() }),
            Err(e) => Err(e.into()),
        }
    }

    /// Snapshots of every tracker the learner has, ordered by item id.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` if trackers cannot be loaded.
    pub async fn export_snapshots(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<TrackerSnapshot>, PracticeError> {
        Ok(self
            .storage
            .trackers
            .trackers_for_learner(learner)
            .await?
            .iter()
            .map(ProgressTracker::to_snapshot)
            .collect())
    }

    /// Validate and store a previously exported snapshot.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Snapshot` for a state no tracker can reach and
    /// `PracticeError::Storage` if it would shrink a stored history.
    pub async fn import_snapshot(
        &self,
        snapshot: TrackerSnapshot,
    ) -> Result<ProgressTracker, PracticeError> {
        let tracker = ProgressTracker::from_snapshot(snapshot)?;
        self.storage.trackers.upsert_tracker(&tracker).await?;
        Ok(tracker)
    }
}

use async_trait::async_trait;
use practice_core::level::ComplexityLevel;
use practice_core::model::{ItemId, LearnerId, ProgressTracker, Subject};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for per-learner, per-item progress trackers.
#[async_trait]
pub trait TrackerRepository: Send + Sync {
    /// Fetch one tracker, `None` if the learner never touched the item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the stored row is corrupt.
    async fn get_tracker(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<Option<ProgressTracker>, StorageError>;

    /// All trackers for a learner, ordered by item id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or a stored row is corrupt.
    async fn trackers_for_learner(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<ProgressTracker>, StorageError>;

    /// Persist or update a tracker.
    ///
    /// Attempt history is append-only: storing a tracker whose history does
    /// not extend the persisted one (shorter, or a different prefix) fails
    /// with `Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the tracker cannot be stored.
    async fn upsert_tracker(&self, tracker: &ProgressTracker) -> Result<(), StorageError>;

    /// Forget a tracker entirely (explicit reset).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no tracker exists.
    async fn delete_tracker(&self, learner: &LearnerId, item: &ItemId)
    -> Result<(), StorageError>;
}

/// Repository contract for the current complexity level per learner and subject.
#[async_trait]
pub trait LevelRepository: Send + Sync {
    /// Stored level, or `ComplexityLevel::MIN` when none was stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the stored value is invalid.
    async fn get_level(
        &self,
        learner: &LearnerId,
        subject: &Subject,
    ) -> Result<ComplexityLevel, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the level cannot be stored.
    async fn set_level(
        &self,
        learner: &LearnerId,
        subject: &Subject,
        level: ComplexityLevel,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    trackers: Arc<Mutex<HashMap<(LearnerId, ItemId), ProgressTracker>>>,
    levels: Arc<Mutex<HashMap<(LearnerId, Subject), ComplexityLevel>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl TrackerRepository for InMemoryRepository {
    async fn get_tracker(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<Option<ProgressTracker>, StorageError> {
        let guard = self.trackers.lock().map_err(poisoned)?;
        Ok(guard.get(&(learner.clone(), item.clone())).cloned())
    }

    async fn trackers_for_learner(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<ProgressTracker>, StorageError> {
        let guard = self.trackers.lock().map_err(poisoned)?;
        let mut found: Vec<ProgressTracker> = guard
            .iter()
            .filter(|((l, _), _)| l == learner)
            .map(|(_, t)| t.clone())
            .collect();
        found.sort_by(|a, b| a.item_id().cmp(b.item_id()));
        Ok(found)
    }

    async fn upsert_tracker(&self, tracker: &ProgressTracker) -> Result<(), StorageError> {
        let mut guard = self.trackers.lock().map_err(poisoned)?;
        let key = (tracker.learner_id().clone(), tracker.item_id().clone());
        if let Some(existing) = guard.get(&key) {
            if !tracker.attempts().starts_with(existing.attempts()) {
                return Err(StorageError::Conflict);
            }
        }
        guard.insert(key, tracker.clone());
        Ok(())
    }

    async fn delete_tracker(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<(), StorageError> {
        let mut guard = self.trackers.lock().map_err(poisoned)?;
        guard
            .remove(&(learner.clone(), item.clone()))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl LevelRepository for InMemoryRepository {
    async fn get_level(
        &self,
        learner: &LearnerId,
        subject: &Subject,
    ) -> Result<ComplexityLevel, StorageError> {
        let guard = self.levels.lock().map_err(poisoned)?;
        Ok(guard
            .get(&(learner.clone(), subject.clone()))
            .copied()
            .unwrap_or_default())
    }

    async fn set_level(
        &self,
        learner: &LearnerId,
        subject: &Subject,
        level: ComplexityLevel,
    ) -> Result<(), StorageError> {
        let mut guard = self.levels.lock().map_err(poisoned)?;
        guard.insert((learner.clone(), subject.clone()), level);
        Ok(())
    }
}

/// Aggregates tracker and level repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub trackers: Arc<dyn TrackerRepository>,
    pub levels: Arc<dyn LevelRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let trackers: Arc<dyn TrackerRepository> = Arc::new(repo.clone());
        let levels: Arc<dyn LevelRepository> = Arc::new(repo);
        Self { trackers, levels }
    }
}

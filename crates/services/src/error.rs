//! Shared error types for the services crate.

use thiserror::Error;

use practice_core::level::LevelError;
use practice_core::model::{ItemId, SnapshotError};
use storage::repository::StorageError;

/// Errors emitted while validating `PracticeSettings`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("max session size must be at least 1")]
    ZeroSessionSize,
    #[error("guidance cache capacity must be at least 1")]
    ZeroCacheCapacity,
}

/// Errors emitted by `PracticeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("no progress recorded for item {item}")]
    UnknownItem { item: ItemId },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

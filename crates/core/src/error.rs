use thiserror::Error;

use crate::level::LevelError;
use crate::model::{IdError, SnapshotError};

/// Construction-boundary failures. Runtime state transitions never fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

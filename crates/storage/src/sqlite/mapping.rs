use chrono::{DateTime, Utc};
use practice_core::model::{
    Attempt, ItemId, LearnerId, Outcome, ProgressTracker, TrackerSnapshot,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn i64_to_u8(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn parse_outcome(s: &str) -> Result<Outcome, StorageError> {
    match s {
        "correct" => Ok(Outcome::Correct),
        "wrong" => Ok(Outcome::Wrong),
        _ => Err(StorageError::Serialization(format!("invalid outcome: {s}"))),
    }
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<Attempt, StorageError> {
    let millis: i64 = row.try_get("attempted_at_ms").map_err(ser)?;
    let at = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::Serialization(format!("invalid attempted_at_ms: {millis}")))?;
    let outcome_str: String = row.try_get("outcome").map_err(ser)?;
    Ok(Attempt::new(parse_outcome(&outcome_str)?, at))
}

/// Rebuilds a tracker from its row plus its ordered attempt history.
///
/// Goes through `TrackerSnapshot` so a corrupt row is rejected the same way
/// a corrupt import would be.
pub(crate) fn map_tracker_row(
    row: &sqlx::sqlite::SqliteRow,
    attempts: Vec<Attempt>,
) -> Result<ProgressTracker, StorageError> {
    let snapshot = TrackerSnapshot {
        item_id: ItemId::new(row.try_get::<String, _>("item_id").map_err(ser)?).map_err(ser)?,
        learner_id: LearnerId::new(row.try_get::<String, _>("learner_id").map_err(ser)?)
            .map_err(ser)?,
        progress: i64_to_u8("progress", row.try_get("progress").map_err(ser)?)?,
        attempts,
        cooldown_sessions_left: i64_to_u32(
            "cooldown_sessions_left",
            row.try_get("cooldown_sessions_left").map_err(ser)?,
        )?,
        mastery_achieved_at: row.try_get("mastery_achieved_at").map_err(ser)?,
        reveal_count: i64_to_u32("reveal_count", row.try_get("reveal_count").map_err(ser)?)?,
    };
    ProgressTracker::from_snapshot(snapshot).map_err(ser)
}

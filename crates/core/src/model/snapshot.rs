use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mastery::{self, MAX_PROGRESS};
use crate::model::{Attempt, ItemId, LearnerId, ProgressTracker};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("progress must be in 0..=5, got {provided}")]
    ProgressOutOfRange { provided: u8 },

    #[error("cooldown of {cooldown} sessions on an unmastered item")]
    CooldownWithoutMastery { cooldown: u32 },

    #[error("mastery timestamp present on an unmastered item")]
    MasteryTimestampWithoutMastery,
}

/// Persisted shape of a `ProgressTracker`.
///
/// Serializes as
/// `{ itemId, learnerId, progress, attempts: [{timestamp, outcome}], cooldownSessionsLeft, masteryAchievedAt?, revealCount }`
/// with attempt timestamps in epoch milliseconds and `masteryAchievedAt` as RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub item_id: ItemId,
    pub learner_id: LearnerId,
    pub progress: u8,
    pub attempts: Vec<Attempt>,
    pub cooldown_sessions_left: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery_achieved_at: Option<DateTime<Utc>>,
    pub reveal_count: u32,
}

impl ProgressTracker {
    #[must_use]
    pub fn to_snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            item_id: self.item_id().clone(),
            learner_id: self.learner_id().clone(),
            progress: self.progress(),
            attempts: self.attempts().to_vec(),
            cooldown_sessions_left: self.cooldown_sessions_left(),
            mastery_achieved_at: self.mastery_achieved_at(),
            reveal_count: self.reveal_count(),
        }
    }

    /// Rehydrate a tracker from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the snapshot describes a state the tracker
    /// can never reach (progress above the cap, cooldown or mastery
    /// timestamp on an unmastered item).
    pub fn from_snapshot(snapshot: TrackerSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.progress > MAX_PROGRESS {
            return Err(SnapshotError::ProgressOutOfRange {
                provided: snapshot.progress,
            });
        }
        let mastered = mastery::is_mastered(snapshot.progress);
        if !mastered && snapshot.cooldown_sessions_left > 0 {
            return Err(SnapshotError::CooldownWithoutMastery {
                cooldown: snapshot.cooldown_sessions_left,
            });
        }
        if !mastered && snapshot.mastery_achieved_at.is_some() {
            return Err(SnapshotError::MasteryTimestampWithoutMastery);
        }

        Ok(Self::from_parts(
            snapshot.item_id,
            snapshot.learner_id,
            snapshot.progress,
            snapshot.attempts,
            snapshot.cooldown_sessions_left,
            snapshot.mastery_achieved_at,
            snapshot.reveal_count,
        ))
    }
}

impl TryFrom<TrackerSnapshot> for ProgressTracker {
    type Error = SnapshotError;

    fn try_from(snapshot: TrackerSnapshot) -> Result<Self, Self::Error> {
        Self::from_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn mastered_turnaround() -> ProgressTracker {
        let mut t =
            ProgressTracker::new(ItemId::new("ka").unwrap(), LearnerId::new("asha").unwrap());
        let now = fixed_now();
        t.record_attempt(false, now);
        t.record_attempt(true, now + Duration::milliseconds(1500));
        t.record_attempt(true, now + Duration::minutes(1));
        t.record_attempt(true, now + Duration::minutes(2));
        t.record_reveal();
        t.decrement_cooldown();
        t
    }

    #[test]
    fn snapshot_round_trip_is_lossless() {
        let t = mastered_turnaround();
        let back = ProgressTracker::from_snapshot(t.to_snapshot()).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.progress(), 3);
        assert_eq!(back.cooldown_sessions_left(), 2);
        assert_eq!(back.reveal_count(), 1);
        assert_eq!(back.attempts(), t.attempts());
    }

    #[test]
    fn snapshot_round_trip_through_json() {
        let t = mastered_turnaround();
        let json = serde_json::to_string(&t.to_snapshot()).unwrap();
        let snapshot: TrackerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(ProgressTracker::from_snapshot(snapshot).unwrap(), t);
    }

    #[test]
    fn snapshot_json_uses_camel_case_and_iso_mastery_time() {
        let t = mastered_turnaround();
        let value = serde_json::to_value(t.to_snapshot()).unwrap();
        assert_eq!(value["itemId"], "ka");
        assert_eq!(value["learnerId"], "asha");
        assert_eq!(value["cooldownSessionsLeft"], 2);
        assert_eq!(value["revealCount"], 1);
        assert_eq!(value["attempts"][0]["outcome"], "wrong");
        assert_eq!(value["attempts"][0]["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(value["masteryAchievedAt"], "2023-11-14T22:14:20Z");
    }

    #[test]
    fn unmastered_snapshot_omits_mastery_time() {
        let t = ProgressTracker::new(ItemId::new("ka").unwrap(), LearnerId::new("asha").unwrap());
        let value = serde_json::to_value(t.to_snapshot()).unwrap();
        assert!(value.get("masteryAchievedAt").is_none());
    }

    #[test]
    fn rejects_unreachable_states() {
        let mut snapshot = mastered_turnaround().to_snapshot();
        snapshot.progress = 9;
        assert_eq!(
            ProgressTracker::from_snapshot(snapshot).unwrap_err(),
            SnapshotError::ProgressOutOfRange { provided: 9 }
        );

        let mut snapshot = mastered_turnaround().to_snapshot();
        snapshot.progress = 1;
        assert!(matches!(
            ProgressTracker::from_snapshot(snapshot),
            Err(SnapshotError::CooldownWithoutMastery { cooldown: 2 })
        ));
    }

    #[test]
    fn rejects_empty_ids_on_deserialize() {
        let json = r#"{"itemId":"","learnerId":"asha","progress":0,"attempts":[],"cooldownSessionsLeft":0,"revealCount":0}"#;
        assert!(serde_json::from_str::<TrackerSnapshot>(json).is_err());
    }
}

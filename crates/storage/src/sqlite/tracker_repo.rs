use std::collections::HashMap;

use practice_core::model::{Attempt, ItemId, LearnerId, ProgressTracker};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, map_attempt_row, map_tracker_row, ser, usize_to_i64},
};
use crate::repository::{StorageError, TrackerRepository};

impl SqliteRepository {
    async fn attempts_for(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT attempted_at_ms, outcome
            FROM attempts
            WHERE learner_id = ?1 AND item_id = ?2
            ORDER BY seq ASC
            ",
        )
        .bind(learner.as_str())
        .bind(item.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}

#[async_trait::async_trait]
impl TrackerRepository for SqliteRepository {
    async fn get_tracker(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<Option<ProgressTracker>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT learner_id, item_id, progress, cooldown_sessions_left,
                   mastery_achieved_at, reveal_count
            FROM trackers
            WHERE learner_id = ?1 AND item_id = ?2
            ",
        )
        .bind(learner.as_str())
        .bind(item.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let attempts = self.attempts_for(learner, item).await?;
        map_tracker_row(&row, attempts).map(Some)
    }

    async fn trackers_for_learner(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<ProgressTracker>, StorageError> {
        let attempt_rows = sqlx::query(
            r"
            SELECT item_id, attempted_at_ms, outcome
            FROM attempts
            WHERE learner_id = ?1
            ORDER BY item_id ASC, seq ASC
            ",
        )
        .bind(learner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut history: HashMap<String, Vec<Attempt>> = HashMap::new();
        for row in &attempt_rows {
            let item_id: String = row.try_get("item_id").map_err(ser)?;
            history
                .entry(item_id)
                .or_default()
                .push(map_attempt_row(row)?);
        }

        let rows = sqlx::query(
            r"
            SELECT learner_id, item_id, progress, cooldown_sessions_left,
                   mastery_achieved_at, reveal_count
            FROM trackers
            WHERE learner_id = ?1
            ORDER BY item_id ASC
            ",
        )
        .bind(learner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let item_id: String = row.try_get("item_id").map_err(ser)?;
            let attempts = history.remove(&item_id).unwrap_or_default();
            out.push(map_tracker_row(row, attempts)?);
        }
        Ok(out)
    }

    async fn upsert_tracker(&self, tracker: &ProgressTracker) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let stored: Vec<Attempt> = sqlx::query(
            r"
            SELECT attempted_at_ms, outcome
            FROM attempts
            WHERE learner_id = ?1 AND item_id = ?2
            ORDER BY seq ASC
            ",
        )
        .bind(tracker.learner_id().as_str())
        .bind(tracker.item_id().as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(conn)?
        .iter()
        .map(map_attempt_row)
        .collect::<Result<_, _>>()?;

        if !tracker.attempts().starts_with(&stored) {
            return Err(StorageError::Conflict);
        }

        sqlx::query(
            r"
            INSERT INTO trackers (
                learner_id, item_id, progress, cooldown_sessions_left,
                mastery_achieved_at, reveal_count
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(learner_id, item_id) DO UPDATE SET
                progress = excluded.progress,
                cooldown_sessions_left = excluded.cooldown_sessions_left,
                mastery_achieved_at = excluded.mastery_achieved_at,
                reveal_count = excluded.reveal_count
            ",
        )
        .bind(tracker.learner_id().as_str())
        .bind(tracker.item_id().as_str())
        .bind(i64::from(tracker.progress()))
        .bind(i64::from(tracker.cooldown_sessions_left()))
        .bind(tracker.mastery_achieved_at())
        .bind(i64::from(tracker.reveal_count()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // history is append-only; only the tail past what is stored is new
        for (seq, attempt) in tracker.attempts().iter().enumerate().skip(stored.len()) {
            sqlx::query(
                r"
                INSERT INTO attempts (learner_id, item_id, seq, attempted_at_ms, outcome)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(tracker.learner_id().as_str())
            .bind(tracker.item_id().as_str())
            .bind(usize_to_i64("seq", seq)?)
            .bind(attempt.at().timestamp_millis())
            .bind(attempt.outcome().as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn delete_tracker(
        &self,
        learner: &LearnerId,
        item: &ItemId,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM trackers WHERE learner_id = ?1 AND item_id = ?2")
            .bind(learner.as_str())
            .bind(item.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

use practice_core::level::ComplexityLevel;
use practice_core::model::{LearnerId, Subject};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{conn, ser},
};
use crate::repository::{LevelRepository, StorageError};

#[async_trait::async_trait]
impl LevelRepository for SqliteRepository {
    async fn get_level(
        &self,
        learner: &LearnerId,
        subject: &Subject,
    ) -> Result<ComplexityLevel, StorageError> {
        let row = sqlx::query(
            r"
            SELECT level
            FROM learner_levels
            WHERE learner_id = ?1 AND subject = ?2
            ",
        )
        .bind(learner.as_str())
        .bind(subject.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(ComplexityLevel::MIN);
        };
        let raw: i64 = row.try_get("level").map_err(ser)?;
        let raw = u8::try_from(raw)
            .map_err(|_| StorageError::Serialization(format!("invalid level: {raw}")))?;
        ComplexityLevel::new(raw).map_err(ser)
    }

    async fn set_level(
        &self,
        learner: &LearnerId,
        subject: &Subject,
        level: ComplexityLevel,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO learner_levels (learner_id, subject, level)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(learner_id, subject) DO UPDATE SET level = excluded.level
            ",
        )
        .bind(learner.as_str())
        .bind(subject.as_str())
        .bind(i64::from(level.value()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}

use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates trackers, their append-only attempt history, and the
/// per-subject level counters.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS trackers (
                    learner_id TEXT NOT NULL,
                    item_id TEXT NOT NULL,
                    progress INTEGER NOT NULL CHECK (progress BETWEEN 0 AND 5),
                    cooldown_sessions_left INTEGER NOT NULL CHECK (cooldown_sessions_left >= 0),
                    mastery_achieved_at TEXT,
                    reveal_count INTEGER NOT NULL CHECK (reveal_count >= 0),
                    PRIMARY KEY (learner_id, item_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS attempts (
                    learner_id TEXT NOT NULL,
                    item_id TEXT NOT NULL,
                    seq INTEGER NOT NULL CHECK (seq >= 0),
                    attempted_at_ms INTEGER NOT NULL,
                    outcome TEXT NOT NULL CHECK (outcome IN ('correct', 'wrong')),
                    PRIMARY KEY (learner_id, item_id, seq),
                    FOREIGN KEY (learner_id, item_id)
                        REFERENCES trackers(learner_id, item_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS learner_levels (
                    learner_id TEXT NOT NULL,
                    subject TEXT NOT NULL,
                    level INTEGER NOT NULL CHECK (level BETWEEN 1 AND 10),
                    PRIMARY KEY (learner_id, subject)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}

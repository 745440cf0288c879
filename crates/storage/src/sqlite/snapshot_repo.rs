use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use study_core::model::{Profile, ProgressRecord, StudyDate, UserId};

use super::SqliteRepository;
use super::mapping::{map_progress_row, ser};
use crate::repository::{SnapshotRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn save_records(&self, records: &[ProgressRecord]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for record in records {
            sqlx::query(
                r"
                INSERT INTO progress_snapshot (
                    user_id,
                    date_utc,
                    reviews_done,
                    new_introduced,
                    goal_override,
                    created_at,
                    updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(user_id, date_utc) DO UPDATE SET
                    reviews_done = excluded.reviews_done,
                    new_introduced = excluded.new_introduced,
                    goal_override = excluded.goal_override,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(record.user_id().to_string())
            .bind(record.date_utc().to_string())
            .bind(i64::from(record.reviews_done()))
            .bind(i64::from(record.new_introduced()))
            .bind(record.goal_override().map(|goal| i64::from(goal.get())))
            .bind(record.created_at())
            .bind(record.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn load_records(
        &self,
        user_id: UserId,
        from: StudyDate,
        to: StudyDate,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                user_id,
                date_utc,
                reviews_done,
                new_introduced,
                goal_override,
                created_at,
                updated_at
            FROM progress_snapshot
            WHERE user_id = ?1
              AND date_utc BETWEEN ?2 AND ?3
            ORDER BY date_utc ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let payload = serde_json::to_string(profile).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO profile_snapshot (id, user_id, payload, saved_at)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                payload = excluded.payload,
                saved_at = excluded.saved_at
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load_profile(&self) -> Result<Option<Profile>, StorageError> {
        let row = sqlx::query("SELECT payload FROM profile_snapshot WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(ser)?;
        serde_json::from_str(&payload).map(Some).map_err(ser)
    }
}

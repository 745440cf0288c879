use async_trait::async_trait;
use sqlx::Row;
use study_core::Lang;

use super::SqliteRepository;
use super::mapping::ser;
use crate::repository::{PreferenceRepository, StorageError};

#[async_trait]
impl PreferenceRepository for SqliteRepository {
    async fn get_lang(&self) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT lang FROM app_preferences WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        row.try_get::<Option<String>, _>("lang").map_err(ser)
    }

    async fn set_lang(&self, lang: Lang) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO app_preferences (id, lang)
            VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET
                lang = excluded.lang
            ",
        )
        .bind(lang.code())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}

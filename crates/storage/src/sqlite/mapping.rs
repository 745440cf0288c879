use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use study_core::model::{DailyGoal, ProgressRecord, StudyDate, UserId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_str(raw: &str) -> Result<UserId, StorageError> {
    raw.parse().map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let user_id = user_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let date_utc: StudyDate = row
        .try_get::<String, _>("date_utc")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let reviews_done = u32_from_i64("reviews_done", row.try_get("reviews_done").map_err(ser)?)?;
    let new_introduced =
        u32_from_i64("new_introduced", row.try_get("new_introduced").map_err(ser)?)?;
    let goal_override = row
        .try_get::<Option<i64>, _>("goal_override")
        .map_err(ser)?
        .map(DailyGoal::new)
        .transpose()
        .map_err(ser)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;

    ProgressRecord::from_persisted(
        user_id,
        date_utc,
        reviews_done,
        new_introduced,
        goal_override,
        created_at,
        updated_at,
    )
    .map_err(ser)
}

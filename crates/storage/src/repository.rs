use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use study_core::Lang;
use study_core::model::{Profile, ProgressRecord, StudyDate, UserId};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Local, device-scoped preferences.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// The stored language code exactly as persisted. Callers validate it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the preference cannot be read.
    async fn get_lang(&self) -> Result<Option<String>, StorageError>;

    /// Persist the chosen language.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the preference cannot be written.
    async fn set_lang(&self, lang: Lang) -> Result<(), StorageError>;
}

/// Last server-confirmed state, kept so the app has something to show offline.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Upsert records by `(user_id, date_utc)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any record cannot be stored; the batch is atomic.
    async fn save_records(&self, records: &[ProgressRecord]) -> Result<(), StorageError>;

    /// Records of `user_id` with `from <= date_utc <= to`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn load_records(
        &self,
        user_id: UserId,
        from: StudyDate,
        to: StudyDate,
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Replace the stored profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn save_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn load_profile(&self) -> Result<Option<Profile>, StorageError>;
}

#[derive(Default)]
struct MemoryState {
    lang: Option<String>,
    profile: Option<Profile>,
    records: BTreeMap<(UserId, StudyDate), ProgressRecord>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw stored language, including values the app would never write.
    #[must_use]
    pub fn with_raw_lang(self, raw: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.state.lock() {
            guard.lang = Some(raw.into());
        }
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryRepository {
    async fn get_lang(&self) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.lang.clone())
    }

    async fn set_lang(&self, lang: Lang) -> Result<(), StorageError> {
        self.lock()?.lang = Some(lang.code().to_string());
        Ok(())
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn save_records(&self, records: &[ProgressRecord]) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        for record in records {
            guard
                .records
                .insert((record.user_id(), record.date_utc()), record.clone());
        }
        Ok(())
    }

    async fn load_records(
        &self,
        user_id: UserId,
        from: StudyDate,
        to: StudyDate,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        if from > to {
            return Ok(Vec::new());
        }
        let guard = self.lock()?;
        Ok(guard
            .records
            .range((user_id, from)..=(user_id, to))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        self.lock()?.profile = Some(profile.clone());
        Ok(())
    }

    async fn load_profile(&self) -> Result<Option<Profile>, StorageError> {
        Ok(self.lock()?.profile.clone())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub preferences: Arc<dyn PreferenceRepository>,
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let preferences: Arc<dyn PreferenceRepository> = Arc::new(repo.clone());
        let snapshots: Arc<dyn SnapshotRepository> = Arc::new(repo);
        Self {
            preferences,
            snapshots,
        }
    }
}

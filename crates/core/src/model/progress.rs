use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{StudyDate, UserId};

/// Largest daily goal accepted anywhere in the app.
pub const MAX_DAILY_GOAL: u32 = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("daily goal must be a positive integer, got {0}")]
    NonPositiveGoal(i64),

    #[error("daily goal {0} exceeds the maximum of {MAX_DAILY_GOAL}")]
    GoalTooLarge(i64),

    #[error("reviews_done cannot decrease (from {current} to {requested})")]
    ReviewsDecreased { current: u32, requested: u32 },

    #[error("updated_at is before created_at")]
    InvalidTimestamps,

    #[error("record for {date} belongs to {found}, cache is scoped to {expected}")]
    ForeignRecord {
        date: StudyDate,
        expected: UserId,
        found: UserId,
    },

    #[error("more than one record for {0} in a single batch")]
    DuplicateDate(StudyDate),

    #[error("range start {from} is after end {to}")]
    InvalidRange { from: StudyDate, to: StudyDate },
}

/// Number of reviews a user aims for on a single study day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct DailyGoal(u32);

impl DailyGoal {
    /// Standing goal used until the profile says otherwise.
    pub const DEFAULT: DailyGoal = DailyGoal(20);

    /// Validate a raw goal.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NonPositiveGoal` for zero or negative values and
    /// `ProgressError::GoalTooLarge` above `MAX_DAILY_GOAL`.
    pub fn new(value: i64) -> Result<Self, ProgressError> {
        if value <= 0 {
            return Err(ProgressError::NonPositiveGoal(value));
        }
        if value > i64::from(MAX_DAILY_GOAL) {
            return Err(ProgressError::GoalTooLarge(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| ProgressError::GoalTooLarge(value))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for DailyGoal {
    type Error = ProgressError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DailyGoal> for u32 {
    fn from(goal: DailyGoal) -> Self {
        goal.0
    }
}

/// Partial update for a progress record. `None` fields keep their prior value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_done: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_introduced: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_override: Option<DailyGoal>,
}

impl ProgressPatch {
    /// Patch that only overrides the goal for the day.
    #[must_use]
    pub fn goal(goal: DailyGoal) -> Self {
        Self {
            goal_override: Some(goal),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reviews_done.is_none() && self.new_introduced.is_none() && self.goal_override.is_none()
    }
}

/// Per-user, per-day ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordWire")]
pub struct ProgressRecord {
    user_id: UserId,
    date_utc: StudyDate,
    reviews_done: u32,
    new_introduced: u32,
    #[serde(default)]
    goal_override: Option<DailyGoal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Wire shape of [`ProgressRecord`]; decoding goes through `from_persisted`.
#[derive(Deserialize)]
struct RecordWire {
    user_id: UserId,
    date_utc: StudyDate,
    reviews_done: u32,
    new_introduced: u32,
    #[serde(default)]
    goal_override: Option<DailyGoal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecordWire> for ProgressRecord {
    type Error = ProgressError;

    fn try_from(wire: RecordWire) -> Result<Self, Self::Error> {
        Self::from_persisted(
            wire.user_id,
            wire.date_utc,
            wire.reviews_done,
            wire.new_introduced,
            wire.goal_override,
            wire.created_at,
            wire.updated_at,
        )
    }
}

impl ProgressRecord {
    /// A fresh, empty record for `date`.
    #[must_use]
    pub fn new(user_id: UserId, date_utc: StudyDate, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            date_utc,
            reviews_done: 0,
            new_introduced: 0,
            goal_override: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidTimestamps` if `updated_at` precedes `created_at`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        date_utc: StudyDate,
        reviews_done: u32,
        new_introduced: u32,
        goal_override: Option<DailyGoal>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        if updated_at < created_at {
            return Err(ProgressError::InvalidTimestamps);
        }
        Ok(Self {
            user_id,
            date_utc,
            reviews_done,
            new_introduced,
            goal_override,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn date_utc(&self) -> StudyDate {
        self.date_utc
    }

    #[must_use]
    pub fn reviews_done(&self) -> u32 {
        self.reviews_done
    }

    #[must_use]
    pub fn new_introduced(&self) -> u32 {
        self.new_introduced
    }

    #[must_use]
    pub fn goal_override(&self) -> Option<DailyGoal> {
        self.goal_override
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The goal in force for this day: the override if set, else the standing goal.
    #[must_use]
    pub fn effective_goal(&self, standing: DailyGoal) -> DailyGoal {
        self.goal_override.unwrap_or(standing)
    }

    /// Merge a partial update into the record.
    ///
    /// Returns `false` (and leaves `updated_at` alone) for an empty patch.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ReviewsDecreased` if the patch would lower `reviews_done`.
    /// The record is unchanged on error.
    pub fn apply_patch(
        &mut self,
        patch: &ProgressPatch,
        now: DateTime<Utc>,
    ) -> Result<bool, ProgressError> {
        if patch.is_empty() {
            return Ok(false);
        }
        if let Some(requested) = patch.reviews_done {
            if requested < self.reviews_done {
                return Err(ProgressError::ReviewsDecreased {
                    current: self.reviews_done,
                    requested,
                });
            }
            self.reviews_done = requested;
        }
        if let Some(new_introduced) = patch.new_introduced {
            self.new_introduced = new_introduced;
        }
        if let Some(goal) = patch.goal_override {
            self.goal_override = Some(goal);
        }
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
        Ok(true)
    }
}

/// Date-keyed records for the signed-in user.
///
/// The first record stored pins the owner; records for anyone else are refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressCache {
    owner: Option<UserId>,
    records: BTreeMap<StudyDate, ProgressRecord>,
}

impl ProgressCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_user(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            records: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    #[must_use]
    pub fn get(&self, date: StudyDate) -> Option<&ProgressRecord> {
        self.records.get(&date)
    }

    /// Records with `from <= date_utc <= to`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidRange` if `from` is after `to`.
    pub fn range(
        &self,
        from: StudyDate,
        to: StudyDate,
    ) -> Result<Vec<&ProgressRecord>, ProgressError> {
        if from > to {
            return Err(ProgressError::InvalidRange { from, to });
        }
        Ok(self.records.range(from..=to).map(|(_, r)| r).collect())
    }

    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the entries for every date present in `items`; other dates are kept.
    ///
    /// The batch is applied all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ForeignRecord` if any item belongs to another user, or
    /// `ProgressError::DuplicateDate` if the batch names the same day twice.
    pub fn replace(&mut self, items: Vec<ProgressRecord>) -> Result<usize, ProgressError> {
        let mut owner = self.owner;
        let mut seen = BTreeSet::new();
        for item in &items {
            let expected = *owner.get_or_insert(item.user_id);
            if item.user_id != expected {
                return Err(ProgressError::ForeignRecord {
                    date: item.date_utc,
                    expected,
                    found: item.user_id,
                });
            }
            if !seen.insert(item.date_utc) {
                return Err(ProgressError::DuplicateDate(item.date_utc));
            }
        }

        let count = items.len();
        self.owner = owner;
        for item in items {
            self.records.insert(item.date_utc, item);
        }
        Ok(count)
    }

    /// Store a single server-confirmed record.
    ///
    /// # Errors
    ///
    /// Same as [`ProgressCache::replace`].
    pub fn upsert(&mut self, record: ProgressRecord) -> Result<(), ProgressError> {
        self.replace(vec![record]).map(|_| ())
    }
}

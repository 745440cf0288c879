//! Remote study API seam.
//!
//! Services depend on these traits; [`HttpStudyApi`] is the production
//! implementation and tests swap in fakes.

use async_trait::async_trait;
use serde::Deserialize;
use study_core::model::{Profile, ProfileUpdateCommand, ProgressPatch, ProgressRecord, StudyDate};

use crate::error::ApiError;

mod http;

pub use http::HttpStudyApi;

/// Which days a progress read covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressQuery {
    Date(StudyDate),
    /// Inclusive on both ends.
    Range { from: StudyDate, to: StudyDate },
}

/// Body of a successful `PATCH /api/progress/<date>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatchAck {
    pub ok: bool,
    /// The record after the merge, when the server sends it back.
    #[serde(default)]
    pub item: Option<ProgressRecord>,
}

#[async_trait]
pub trait ProgressApi: Send + Sync {
    /// `GET /api/progress`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures, non-2xx statuses or undecodable bodies.
    async fn fetch_progress(&self, query: ProgressQuery) -> Result<Vec<ProgressRecord>, ApiError>;

    /// `PATCH /api/progress/<date>` with a partial update.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures, non-2xx statuses, or `ok: false`.
    async fn patch_progress(
        &self,
        date: StudyDate,
        patch: &ProgressPatch,
    ) -> Result<PatchAck, ApiError>;
}

#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// `GET /api/me`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures, non-2xx statuses or undecodable bodies.
    async fn get_profile(&self) -> Result<Profile, ApiError>;

    /// `PATCH /api/me` with an already validated command.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or non-2xx statuses.
    async fn patch_profile(&self, command: &ProfileUpdateCommand) -> Result<(), ApiError>;
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use storage::repository::SnapshotRepository;
use study_core::model::{Profile, ProfileUpdateCommand};
use tracing::{debug, warn};

use crate::api::ProfileApi;
use crate::error::ProfileServiceError;
use crate::progress_ledger::ProgressLedger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdateOutcome {
    /// The payload was valid but changed nothing; no request was made.
    NoOp,
    Applied(ProfileUpdateCommand),
}

/// Loads and edits the signed-in user's profile.
pub struct ProfileService {
    api: Arc<dyn ProfileApi>,
    snapshots: Option<Arc<dyn SnapshotRepository>>,
    ledger: Option<Arc<ProgressLedger>>,
    current: Mutex<Option<Profile>>,
}

impl ProfileService {
    #[must_use]
    pub fn new(api: Arc<dyn ProfileApi>) -> Self {
        Self {
            api,
            snapshots: None,
            ledger: None,
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotRepository>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Keep the ledger's standing goal in step with the profile's `daily_goal`.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<ProgressLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    fn slot(&self) -> MutexGuard<'_, Option<Profile>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The last profile loaded or updated in this session.
    #[must_use]
    pub fn current(&self) -> Option<Profile> {
        self.slot().clone()
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::Api` if `GET /api/me` fails.
    pub async fn load(&self) -> Result<Profile, ProfileServiceError> {
        let profile = self.api.get_profile().await?;
        *self.slot() = Some(profile.clone());
        if let Some(ledger) = &self.ledger {
            ledger.set_standing_goal(profile.daily_goal);
        }
        self.save_snapshot(&profile).await;
        Ok(profile)
    }

    /// Validate `raw` and send it to the server.
    ///
    /// Rejected payloads never reach the network, and neither do empty ones.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Validation` for payloads outside the
    /// allow-list and `ProfileServiceError::Api` if the PATCH fails.
    pub async fn update(&self, raw: &Value) -> Result<ProfileUpdateOutcome, ProfileServiceError> {
        let command = ProfileUpdateCommand::parse(raw).inspect_err(|err| {
            debug!(error = %err, "profile update rejected");
        })?;
        if command.is_empty() {
            return Ok(ProfileUpdateOutcome::NoOp);
        }

        self.api.patch_profile(&command).await?;
        if let (Some(ledger), Some(goal)) = (&self.ledger, command.daily_goal()) {
            ledger.set_standing_goal(goal);
        }

        let updated = {
            let mut slot = self.slot();
            slot.as_mut().map(|profile| {
                profile.apply(&command);
                profile.clone()
            })
        };
        if let Some(profile) = updated {
            self.save_snapshot(&profile).await;
        }
        Ok(ProfileUpdateOutcome::Applied(command))
    }

    /// The profile saved by the last successful load, for offline starts.
    pub async fn cached_offline(&self) -> Option<Profile> {
        let snapshots = self.snapshots.as_ref()?;
        match snapshots.load_profile().await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "profile snapshot unavailable");
                None
            }
        }
    }

    async fn save_snapshot(&self, profile: &Profile) {
        let Some(snapshots) = &self.snapshots else {
            return;
        };
        if let Err(err) = snapshots.save_profile(profile).await {
            warn!(error = %err, "profile snapshot write failed");
        }
    }
}

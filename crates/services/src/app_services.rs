use std::sync::Arc;

use storage::repository::Storage;
use study_core::Lang;
use study_core::model::{DailyGoal, Profile};
use tracing::{info, warn};

use crate::Clock;
use crate::api::{HttpStudyApi, ProfileApi, ProgressApi};
use crate::config::ApiConfig;
use crate::error::AppServicesError;
use crate::locale_service::{LocaleEnvironment, LocaleService};
use crate::profile_service::ProfileService;
use crate::progress_ledger::ProgressLedger;

/// Assembles app-facing services and resolves the startup language and goal.
#[derive(Clone)]
pub struct AppServices {
    ledger: Arc<ProgressLedger>,
    profiles: Arc<ProfileService>,
    locale: Arc<LocaleService>,
    lang: Lang,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP study API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the HTTP
    /// client cannot be built. An unreachable API is not an error.
    pub async fn new_sqlite(
        db_url: &str,
        config: ApiConfig,
        clock: Clock,
        environment: LocaleEnvironment,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api = Arc::new(HttpStudyApi::new(config)?);
        let progress_api: Arc<dyn ProgressApi> = api.clone();
        let profile_api: Arc<dyn ProfileApi> = api;
        Ok(Self::bootstrap(storage, progress_api, profile_api, clock, environment).await)
    }

    /// Wire services over any storage and API, then load the startup state.
    ///
    /// The standing goal comes from the profile, falling back to the offline
    /// snapshot and then [`DailyGoal::DEFAULT`]. Later profile edits keep it
    /// current.
    pub async fn bootstrap(
        storage: Storage,
        progress_api: Arc<dyn ProgressApi>,
        profile_api: Arc<dyn ProfileApi>,
        clock: Clock,
        environment: LocaleEnvironment,
    ) -> Self {
        let locale = LocaleService::new(Arc::clone(&storage.preferences), environment);
        let lang = locale.resolve().await;

        let ledger = Arc::new(
            ProgressLedger::new(progress_api, clock, DailyGoal::DEFAULT)
                .with_snapshots(Arc::clone(&storage.snapshots)),
        );
        let profiles = ProfileService::new(profile_api)
            .with_snapshots(Arc::clone(&storage.snapshots))
            .with_ledger(Arc::clone(&ledger));
        if let Some(profile) = load_profile(&profiles).await {
            ledger.set_standing_goal(profile.daily_goal);
            let hydrated = ledger.hydrate(profile.user_id).await;
            info!(user_id = %profile.user_id, hydrated, lang = %lang, "study services ready");
        }

        Self {
            ledger,
            profiles: Arc::new(profiles),
            locale: Arc::new(locale),
            lang,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<ProgressLedger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn locale(&self) -> Arc<LocaleService> {
        Arc::clone(&self.locale)
    }

    /// Language resolved at startup.
    #[must_use]
    pub fn lang(&self) -> Lang {
        self.lang
    }
}

async fn load_profile(profiles: &ProfileService) -> Option<Profile> {
    match profiles.load().await {
        Ok(profile) => Some(profile),
        Err(err) => {
            warn!(error = %err, "profile load failed, using offline copy");
            profiles.cached_offline().await
        }
    }
}

use std::sync::Arc;

use services::{LocaleService, ProfileService, ProgressLedger};
use study_core::Lang;

pub trait UiApp: Send + Sync {
    fn ledger(&self) -> Arc<ProgressLedger>;
    fn profiles(&self) -> Arc<ProfileService>;
    fn locale(&self) -> Arc<LocaleService>;

    /// Language resolved at startup.
    fn lang(&self) -> Lang;
}

#[derive(Clone)]
pub struct AppContext {
    ledger: Arc<ProgressLedger>,
    profiles: Arc<ProfileService>,
    locale: Arc<LocaleService>,
    initial_lang: Lang,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            ledger: app.ledger(),
            profiles: app.profiles(),
            locale: app.locale(),
            initial_lang: app.lang(),
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

    /// Seed for the language signal; later switches live in the signal.
    #[must_use]
    pub fn initial_lang(&self) -> Lang {
        self.initial_lang
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

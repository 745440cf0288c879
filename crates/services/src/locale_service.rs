use std::env;
use std::sync::Arc;

use storage::repository::{PreferenceRepository, StorageError};
use study_core::Lang;
use study_core::i18n::resolve_lang;
use tracing::warn;

/// Locale variables consulted in order; the first non-empty one wins.
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// System language captured once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleEnvironment {
    system_lang: Option<String>,
}

impl LocaleEnvironment {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`LocaleEnvironment::from_env`] with an explicit variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let system_lang = LOCALE_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .filter(|value| !matches!(value.as_str(), "C" | "POSIX"));
        Self { system_lang }
    }

    #[must_use]
    pub fn fixed(system_lang: Option<&str>) -> Self {
        Self {
            system_lang: system_lang.map(str::to_string),
        }
    }

    #[must_use]
    pub fn system_lang(&self) -> Option<&str> {
        self.system_lang.as_deref()
    }
}

/// Resolves and persists the display language.
#[derive(Clone)]
pub struct LocaleService {
    preferences: Arc<dyn PreferenceRepository>,
    environment: LocaleEnvironment,
}

impl LocaleService {
    #[must_use]
    pub fn new(preferences: Arc<dyn PreferenceRepository>, environment: LocaleEnvironment) -> Self {
        Self {
            preferences,
            environment,
        }
    }

    /// Stored preference, then system language, then English.
    ///
    /// A preference that cannot be read counts as no preference.
    pub async fn resolve(&self) -> Lang {
        let stored = match self.preferences.get_lang().await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "language preference unavailable");
                None
            }
        };
        resolve_lang(stored.as_deref(), self.environment.system_lang())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the preference cannot be written.
    pub async fn set_lang(&self, lang: Lang) -> Result<(), StorageError> {
        self.preferences.set_lang(lang).await
    }
}

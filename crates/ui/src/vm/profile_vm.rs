use serde::Serialize;
use serde_json::Value;
use services::{ProfileServiceError, ProfileUpdateOutcome};
use study_core::Lang;
use study_core::model::{DISPLAY_NAME_MAX_GRAPHEMES, Profile, ProfileValidationError};
use study_core::text::GraphemeCounter;

use crate::views::ViewError;

/// Editable copy of the profile, as typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileFormVm {
    pub display_name: String,
    pub daily_goal: String,
    pub locale: Option<Lang>,
    pub timezone: String,
}

#[derive(Serialize)]
struct ProfileDraft<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    daily_goal: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<Lang>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<&'a str>,
}

impl ProfileFormVm {
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            display_name: profile.display_name.clone().unwrap_or_default(),
            daily_goal: profile.daily_goal.get().to_string(),
            locale: profile.locale,
            timezone: profile.timezone.clone().unwrap_or_default(),
        }
    }

    /// Payload holding only the fields that differ from `original`.
    ///
    /// Values go out as typed; the service validates them.
    #[must_use]
    pub fn changes_from(&self, original: &Profile) -> Value {
        let before = Self::from_profile(original);
        let changed = |now: &str, then: &str| now.trim() != then.trim();

        let daily_goal = changed(&self.daily_goal, &before.daily_goal).then(|| {
            let raw = self.daily_goal.trim();
            raw.parse::<i64>()
                .map_or_else(|_| Value::String(raw.to_string()), Value::from)
        });
        let draft = ProfileDraft {
            display_name: changed(&self.display_name, &before.display_name)
                .then_some(self.display_name.as_str()),
            daily_goal,
            locale: (self.locale != before.locale).then_some(self.locale).flatten(),
            timezone: changed(&self.timezone, &before.timezone).then_some(self.timezone.as_str()),
        };
        serde_json::to_value(draft).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameCounterVm {
    pub count: usize,
    pub max: usize,
    pub over_limit: bool,
    pub label: String,
}

/// Character counter for the display name field, counted the way validation counts.
#[must_use]
pub fn map_name_counter(counter: &mut GraphemeCounter, text: &str) -> NameCounterVm {
    let count = counter.count(text.trim());
    let max = DISPLAY_NAME_MAX_GRAPHEMES;
    NameCounterVm {
        count,
        max,
        over_limit: count > max,
        label: format!("{count}/{max}"),
    }
}

#[must_use]
pub fn profile_outcome_message(outcome: &ProfileUpdateOutcome) -> &'static str {
    match outcome {
        ProfileUpdateOutcome::NoOp => "Nothing to save.",
        ProfileUpdateOutcome::Applied(_) => "Profile saved.",
    }
}

#[must_use]
pub fn profile_error_message(err: &ProfileServiceError) -> String {
    match err {
        ProfileServiceError::Validation(ProfileValidationError::InvalidField { field, reason }) => {
            format!("{}: {reason}", field_label(field))
        }
        ProfileServiceError::Validation(invalid) => invalid.to_string(),
        ProfileServiceError::Api(api) => ViewError::from_api(api).message().to_string(),
        _ => ViewError::Unknown.message().to_string(),
    }
}

fn field_label(field: &str) -> &str {
    match field {
        "display_name" => "Display name",
        "daily_goal" => "Daily goal",
        "locale" => "Language",
        "timezone" => "Time zone",
        other => other,
    }
}

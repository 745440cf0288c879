use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::i18n::Lang;
use crate::model::{DailyGoal, UserId};
use crate::text::count_graphemes;

/// Keys a profile update may carry. Anything else rejects the whole command.
pub const PROFILE_UPDATE_FIELDS: [&str; 4] = ["display_name", "daily_goal", "locale", "timezone"];

pub const DISPLAY_NAME_MAX_GRAPHEMES: usize = 50;
pub const TIMEZONE_MAX_LEN: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileValidationError {
    #[error("profile update must be a JSON object")]
    NotAnObject,

    #[error("unrecognized profile field(s): {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ProfileValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// The signed-in user's profile as returned by `GET /api/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    pub daily_goal: DailyGoal,
    #[serde(default)]
    pub locale: Option<Lang>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Profile {
    /// Fold an accepted update into the local copy.
    pub fn apply(&mut self, command: &ProfileUpdateCommand) {
        if let Some(name) = command.display_name() {
            self.display_name = Some(name.to_string());
        }
        if let Some(goal) = command.daily_goal() {
            self.daily_goal = goal;
        }
        if let Some(locale) = command.locale() {
            self.locale = Some(locale);
        }
        if let Some(timezone) = command.timezone() {
            self.timezone = Some(timezone.to_string());
        }
    }
}

/// Validated partial profile update. Only obtainable through [`ProfileUpdateCommand::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdateCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    daily_goal: Option<DailyGoal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<Lang>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<String>,
}

impl ProfileUpdateCommand {
    /// Validate an arbitrary JSON value against the strict profile schema.
    ///
    /// `{}` is accepted as an empty command. Unknown keys are checked first and
    /// reported together, sorted, before any field is looked at.
    ///
    /// # Errors
    ///
    /// Returns `ProfileValidationError` if the value is not an object, carries a key
    /// outside [`PROFILE_UPDATE_FIELDS`], or a known field fails validation.
    pub fn parse(value: &Value) -> Result<Self, ProfileValidationError> {
        let Some(map) = value.as_object() else {
            return Err(ProfileValidationError::NotAnObject);
        };

        let mut unknown: Vec<String> = map
            .keys()
            .filter(|key| !PROFILE_UPDATE_FIELDS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(ProfileValidationError::UnknownFields(unknown));
        }

        Ok(Self {
            display_name: field(map, "display_name", parse_display_name)?,
            daily_goal: field(map, "daily_goal", parse_daily_goal)?,
            locale: field(map, "locale", parse_locale)?,
            timezone: field(map, "timezone", parse_timezone)?,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.daily_goal.is_none()
            && self.locale.is_none()
            && self.timezone.is_none()
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn daily_goal(&self) -> Option<DailyGoal> {
        self.daily_goal
    }

    #[must_use]
    pub fn locale(&self) -> Option<Lang> {
        self.locale
    }

    #[must_use]
    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }
}

fn field<T>(
    map: &Map<String, Value>,
    name: &'static str,
    parse: fn(&Value) -> Result<T, String>,
) -> Result<Option<T>, ProfileValidationError> {
    map.get(name)
        .map(|value| parse(value).map_err(|reason| ProfileValidationError::invalid(name, reason)))
        .transpose()
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "expected a string".to_string())
}

fn parse_display_name(value: &Value) -> Result<String, String> {
    let name = expect_str(value)?.trim();
    if name.is_empty() {
        return Err("must not be empty".into());
    }
    if count_graphemes(name) > DISPLAY_NAME_MAX_GRAPHEMES {
        return Err(format!(
            "must be at most {DISPLAY_NAME_MAX_GRAPHEMES} characters"
        ));
    }
    Ok(name.to_string())
}

fn parse_daily_goal(value: &Value) -> Result<DailyGoal, String> {
    let raw = value
        .as_i64()
        .ok_or_else(|| "expected an integer".to_string())?;
    DailyGoal::new(raw).map_err(|err| err.to_string())
}

fn parse_locale(value: &Value) -> Result<Lang, String> {
    expect_str(value)?
        .parse::<Lang>()
        .map_err(|err| err.to_string())
}

fn parse_timezone(value: &Value) -> Result<String, String> {
    let tz = expect_str(value)?.trim();
    if tz.is_empty() {
        return Err("must not be empty".into());
    }
    if tz.len() > TIMEZONE_MAX_LEN {
        return Err(format!("must be at most {TIMEZONE_MAX_LEN} characters"));
    }
    if tz.chars().any(char::is_whitespace) {
        return Err("must not contain whitespace".into());
    }
    Ok(tz.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_object_is_an_empty_command() {
        let command = ProfileUpdateCommand::parse(&json!({})).unwrap();
        assert!(command.is_empty());
        assert_eq!(serde_json::to_value(&command).unwrap(), json!({}));
    }

    #[test]
    fn privileged_and_unknown_keys_are_rejected() {
        assert_eq!(
            ProfileUpdateCommand::parse(&json!({ "is_admin": true })),
            Err(ProfileValidationError::UnknownFields(vec!["is_admin".into()]))
        );
        assert_eq!(
            ProfileUpdateCommand::parse(&json!({ "any": "value" })),
            Err(ProfileValidationError::UnknownFields(vec!["any".into()]))
        );
    }

    #[test]
    fn unknown_key_next_to_valid_ones_rejects_everything() {
        let err = ProfileUpdateCommand::parse(&json!({
            "display_name": "Ada",
            "role": "admin",
            "is_admin": true
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ProfileValidationError::UnknownFields(vec!["is_admin".into(), "role".into()])
        );
    }

    #[test]
    fn unknown_keys_are_reported_before_field_errors() {
        let err = ProfileUpdateCommand::parse(&json!({ "daily_goal": 0, "x": 1 })).unwrap_err();
        assert!(matches!(err, ProfileValidationError::UnknownFields(_)));
    }

    #[test]
    fn non_objects_are_rejected() {
        for value in [json!(null), json!([]), json!("display_name"), json!(3)] {
            assert_eq!(
                ProfileUpdateCommand::parse(&value),
                Err(ProfileValidationError::NotAnObject)
            );
        }
    }

    #[test]
    fn accepted_command_is_normalized() {
        let command = ProfileUpdateCommand::parse(&json!({
            "display_name": "  Ada Lovelace ",
            "daily_goal": 25,
            "locale": "pl",
            "timezone": "Europe/Warsaw"
        }))
        .unwrap();

        assert_eq!(command.display_name(), Some("Ada Lovelace"));
        assert_eq!(command.daily_goal().map(DailyGoal::get), Some(25));
        assert_eq!(command.locale(), Some(Lang::Pl));
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({
                "display_name": "Ada Lovelace",
                "daily_goal": 25,
                "locale": "pl",
                "timezone": "Europe/Warsaw"
            })
        );
    }

    #[test]
    fn field_rules() {
        let cases = [
            (json!({ "display_name": "   " }), "display_name"),
            (json!({ "display_name": 42 }), "display_name"),
            (json!({ "daily_goal": 0 }), "daily_goal"),
            (json!({ "daily_goal": -5 }), "daily_goal"),
            (json!({ "daily_goal": 2.5 }), "daily_goal"),
            (json!({ "daily_goal": "10" }), "daily_goal"),
            (json!({ "locale": "de" }), "locale"),
            (json!({ "timezone": "Europe/ Warsaw" }), "timezone"),
            (json!({ "timezone": null }), "timezone"),
        ];
        for (input, expected) in cases {
            match ProfileUpdateCommand::parse(&input) {
                Err(ProfileValidationError::InvalidField { field, .. }) => {
                    assert_eq!(field, expected, "input: {input}");
                }
                other => panic!("expected {expected} to be rejected for {input}, got {other:?}"),
            }
        }
    }

    #[test]
    fn display_name_limit_counts_graphemes() {
        let fits = "👋".repeat(DISPLAY_NAME_MAX_GRAPHEMES);
        assert!(ProfileUpdateCommand::parse(&json!({ "display_name": fits })).is_ok());

        let too_long = "a".repeat(DISPLAY_NAME_MAX_GRAPHEMES + 1);
        assert!(ProfileUpdateCommand::parse(&json!({ "display_name": too_long })).is_err());
    }

    #[test]
    fn profile_applies_only_present_fields() {
        let mut profile = Profile {
            user_id: UserId::random(),
            display_name: Some("Ada".into()),
            daily_goal: DailyGoal::new(20).unwrap(),
            locale: None,
            timezone: Some("UTC".into()),
        };
        let command = ProfileUpdateCommand::parse(&json!({ "daily_goal": 30 })).unwrap();

        profile.apply(&command);

        assert_eq!(profile.daily_goal.get(), 30);
        assert_eq!(profile.display_name.as_deref(), Some("Ada"));
        assert_eq!(profile.timezone.as_deref(), Some("UTC"));
    }
}

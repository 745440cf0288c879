//! Landing copy in the two supported languages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language `{raw}`, expected one of: en, pl")]
pub struct LangParseError {
    raw: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Pl,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::En, Lang::Pl];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Pl => "pl",
        }
    }

    #[must_use]
    pub fn copy(self) -> &'static LandingCopy {
        match self {
            Lang::En => &EN,
            Lang::Pl => &PL,
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = LangParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Lang::En),
            "pl" => Ok(Lang::Pl),
            _ => Err(LangParseError { raw: s.to_string() }),
        }
    }
}

/// Pick the display language.
///
/// A stored preference wins when it names a supported language; otherwise a
/// system language starting with `pl` (`pl`, `pl-PL`, `pl_PL.UTF-8`) selects
/// Polish; anything else is English.
#[must_use]
pub fn resolve_lang(stored: Option<&str>, system: Option<&str>) -> Lang {
    if let Some(lang) = stored.and_then(|raw| raw.parse().ok()) {
        return lang;
    }
    match system {
        Some(raw) if raw.trim().to_ascii_lowercase().starts_with("pl") => Lang::Pl,
        _ => Lang::En,
    }
}

/// Shell copy for one language.
#[derive(Debug, PartialEq, Eq)]
pub struct LandingCopy {
    pub brand: &'static str,
    pub nav_progress: &'static str,
    pub nav_profile: &'static str,
    pub footer: &'static str,
}

static EN: LandingCopy = LandingCopy {
    brand: "Learn",
    nav_progress: "Progress",
    nav_profile: "Profile",
    footer: "Made for people who like to learn a little every day.",
};

static PL: LandingCopy = LandingCopy {
    brand: "Learn",
    nav_progress: "Postępy",
    nav_profile: "Profil",
    footer: "Dla tych, którzy lubią uczyć się codziennie po trochu.",
};

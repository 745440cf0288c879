mod date;
mod ids;
mod profile;
mod progress;
mod session;

pub use date::{DateParseError, StudyDate};
pub use ids::{ParseIdError, UserId};

pub use profile::{
    DISPLAY_NAME_MAX_GRAPHEMES, PROFILE_UPDATE_FIELDS, Profile, ProfileUpdateCommand,
    ProfileValidationError, TIMEZONE_MAX_LEN,
};
pub use progress::{
    DailyGoal, MAX_DAILY_GOAL, ProgressCache, ProgressError, ProgressPatch, ProgressRecord,
};
pub use session::{SessionMeta, SessionProgressState};

#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod config;
pub mod error;
pub mod locale_service;
pub mod profile_service;
pub mod progress_ledger;

pub use study_core::Clock;

pub use api::{HttpStudyApi, PatchAck, ProfileApi, ProgressApi, ProgressQuery};
pub use app_services::AppServices;
pub use config::ApiConfig;
pub use error::{ApiError, AppServicesError, ConfigError, LedgerError, ProfileServiceError};
pub use locale_service::{LocaleEnvironment, LocaleService};
pub use profile_service::{ProfileService, ProfileUpdateOutcome};
pub use progress_ledger::{GoalSync, GoalUpdate, LedgerFailure, ProgressLedger, StagedGoal};

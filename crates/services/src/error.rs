//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;
use study_core::model::{ProfileValidationError, ProgressError};

/// Errors emitted while talking to the study API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("server did not acknowledge the update")]
    NotAcknowledged,
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// HTTP status behind the failure, when the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ApiError::HttpStatus(status) => Some(*status),
            ApiError::Http(err) => err.status(),
            _ => None,
        }
    }
}

/// Errors emitted by `ProgressLedger`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error(transparent)]
    Validation(#[from] ProfileValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid API base URL `{raw}`")]
    InvalidBaseUrl { raw: String },
    #[error("unsupported API URL scheme `{scheme}`, expected http or https")]
    UnsupportedScheme { scheme: String },
    #[error("invalid HTTP timeout `{raw}`, expected whole seconds")]
    InvalidTimeout { raw: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

use dioxus::prelude::*;
use services::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    Unreachable,
    Unauthorized,
}

impl ViewError {
    #[must_use]
    pub fn from_api(err: &ApiError) -> Self {
        if matches!(err, ApiError::NotAcknowledged) {
            return Self::Unknown;
        }
        match err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => Self::Unauthorized,
            Some(_) => Self::Unknown,
            None => Self::Unreachable,
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Unknown => "Something went wrong. Please try again.",
            Self::Unreachable => "Can't reach the server. Showing saved data.",
            Self::Unauthorized => "Your session has expired. Please sign in again.",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: &Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}

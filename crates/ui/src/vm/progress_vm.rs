use services::{GoalSync, LedgerError};
use study_core::model::{MAX_DAILY_GOAL, ProgressError, SessionProgressState};

use crate::views::ViewError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalProgressVm {
    pub done: u32,
    pub goal: u32,
    /// Uncapped; over-achievement shows as more than 100.
    pub percent: u32,
    pub bar_percent: u32,
    pub goal_met: bool,
    pub remaining_label: String,
    pub queue_label: String,
}

#[must_use]
pub fn map_goal_progress(state: &SessionProgressState) -> GoalProgressVm {
    let remaining_label = if state.goal_met() {
        "Daily goal reached".to_string()
    } else {
        format!("{} to go", state.remaining())
    };
    GoalProgressVm {
        done: state.session_progress,
        goal: state.meta.daily_goal.get(),
        percent: state.percent(),
        bar_percent: state.percent_capped(),
        goal_met: state.goal_met(),
        remaining_label,
        queue_label: format!(
            "{} due \u{b7} {} new",
            state.meta.due_count, state.meta.new_selected
        ),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GoalSyncVm {
    Hidden,
    Saving,
    Saved,
    Failed(String),
}

#[must_use]
pub fn map_goal_sync(sync: &GoalSync) -> GoalSyncVm {
    match sync {
        GoalSync::Idle => GoalSyncVm::Hidden,
        GoalSync::Pending(_) => GoalSyncVm::Saving,
        GoalSync::Confirmed(_) => GoalSyncVm::Saved,
        GoalSync::Failed { goal, .. } => {
            GoalSyncVm::Failed(format!("Goal of {} not saved yet.", goal.get()))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalInputError {
    NotANumber,
}

/// Parse the goal field. Range checks are left to the ledger.
///
/// # Errors
///
/// Returns `GoalInputError::NotANumber` for anything that is not a whole number.
pub fn parse_goal_input(raw: &str) -> Result<i64, GoalInputError> {
    raw.trim().parse().map_err(|_| GoalInputError::NotANumber)
}

#[must_use]
pub fn goal_error_message(err: &LedgerError) -> String {
    match err {
        LedgerError::Progress(ProgressError::NonPositiveGoal(_)) => {
            "Daily goal must be at least 1.".to_string()
        }
        LedgerError::Progress(ProgressError::GoalTooLarge(_)) => {
            format!("Daily goal can be at most {MAX_DAILY_GOAL}.")
        }
        LedgerError::Api(api) => ViewError::from_api(api).message().to_string(),
        _ => ViewError::Unknown.message().to_string(),
    }
}

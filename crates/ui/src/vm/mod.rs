mod profile_vm;
mod progress_vm;

pub use profile_vm::{
    NameCounterVm, ProfileFormVm, map_name_counter, profile_error_message,
    profile_outcome_message,
};
pub use progress_vm::{
    GoalInputError, GoalProgressVm, GoalSyncVm, goal_error_message, map_goal_progress,
    map_goal_sync, parse_goal_input,
};

mod profile;
mod progress;
mod state;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use profile::ProfileView;
pub use progress::{GoalProgressCard, ProgressView};
pub use state::{ViewError, ViewState, view_state_from_resource};

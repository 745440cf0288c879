use crate::model::{DailyGoal, ProgressRecord};

/// Counters the study screen shows for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMeta {
    pub daily_goal: DailyGoal,
    pub reviews_done_today: u32,
    pub due_count: u32,
    pub new_selected: u32,
}

/// Client-side view of "goal vs. achieved" for the current study day.
///
/// Never persisted: built from the latest record plus the standing goal, nudged
/// locally by goal edits and completed reviews, and superseded by every fresh read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgressState {
    pub meta: SessionMeta,
    pub session_progress: u32,
}

impl SessionProgressState {
    #[must_use]
    pub fn new(standing_goal: DailyGoal) -> Self {
        Self {
            meta: SessionMeta {
                daily_goal: standing_goal,
                reviews_done_today: 0,
                due_count: 0,
                new_selected: 0,
            },
            session_progress: 0,
        }
    }

    #[must_use]
    pub fn from_record(record: Option<&ProgressRecord>, standing_goal: DailyGoal) -> Self {
        let mut state = Self::new(standing_goal);
        if let Some(record) = record {
            state.supersede(record, standing_goal);
        }
        state
    }

    /// Take the server's view of the day. Queue counters are not part of the
    /// record and are left as they are.
    pub fn supersede(&mut self, record: &ProgressRecord, standing_goal: DailyGoal) {
        self.meta.daily_goal = record.effective_goal(standing_goal);
        self.meta.reviews_done_today = record.reviews_done();
        self.session_progress = record.reviews_done();
    }

    /// Optimistic goal change: only the denominator moves.
    pub fn apply_goal(&mut self, goal: DailyGoal) {
        self.meta.daily_goal = goal;
    }

    pub fn set_queue(&mut self, due_count: u32, new_selected: u32) {
        self.meta.due_count = due_count;
        self.meta.new_selected = new_selected;
    }

    /// Count one completed review, drawing it from the new or due queue.
    pub fn record_review(&mut self, was_new: bool) {
        self.meta.reviews_done_today = self.meta.reviews_done_today.saturating_add(1);
        self.session_progress = self.session_progress.saturating_add(1);
        if was_new {
            self.meta.new_selected = self.meta.new_selected.saturating_sub(1);
        } else {
            self.meta.due_count = self.meta.due_count.saturating_sub(1);
        }
    }

    /// `session_progress / daily_goal * 100`, rounded half up. Can exceed 100.
    #[must_use]
    pub fn percent(&self) -> u32 {
        let goal = u64::from(self.meta.daily_goal.get());
        let scaled = u64::from(self.session_progress) * 100;
        u32::try_from((scaled + goal / 2) / goal).unwrap_or(u32::MAX)
    }

    /// [`percent`](Self::percent) clamped for progress bars.
    #[must_use]
    pub fn percent_capped(&self) -> u32 {
        self.percent().min(100)
    }

    #[must_use]
    pub fn goal_met(&self) -> bool {
        self.session_progress >= self.meta.daily_goal.get()
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.meta.daily_goal.get().saturating_sub(self.session_progress)
    }
}

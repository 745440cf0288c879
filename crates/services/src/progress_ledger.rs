//! Client-side ledger of daily study progress.
//!
//! Reads go to the progress API and replace the cached days they return.
//! Goal edits are applied to the session state first and confirmed by a PATCH
//! afterwards; a failed PATCH is not rolled back but left for the next read to
//! reconcile.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Days;
use storage::repository::SnapshotRepository;
use study_core::Clock;
use study_core::model::{
    DailyGoal, ProgressCache, ProgressError, ProgressPatch, ProgressRecord, SessionProgressState,
    StudyDate, UserId,
};
use tracing::{debug, warn};

use crate::api::{ProgressApi, ProgressQuery};
use crate::error::{ApiError, LedgerError};

/// How many days back `hydrate` reads from the offline snapshot.
const HYDRATE_DAYS: u64 = 30;

/// The most recent failure, kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl LedgerFailure {
    fn from_api(err: &ApiError) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    fn from_progress(err: &ProgressError) -> Self {
        Self {
            status: None,
            message: err.to_string(),
        }
    }
}

/// Where the last goal edit stands with the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GoalSync {
    #[default]
    Idle,
    Pending(DailyGoal),
    Confirmed(DailyGoal),
    Failed { goal: DailyGoal, error: LedgerFailure },
}

/// A goal shown locally and waiting to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct StagedGoal {
    date: StudyDate,
    goal: DailyGoal,
    seq: u64,
}

impl StagedGoal {
    #[must_use]
    pub fn goal(&self) -> DailyGoal {
        self.goal
    }
}

/// Result of a goal PATCH that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalUpdate {
    Confirmed(DailyGoal),
    /// A newer edit was issued while this one was in flight; its response was dropped.
    Superseded,
}

struct LedgerState {
    cache: ProgressCache,
    session: SessionProgressState,
    session_date: StudyDate,
    standing_goal: DailyGoal,
    last_error: Option<LedgerFailure>,
    goal_seq: u64,
    goal_sync: GoalSync,
    /// Day the latest staged goal was sent for.
    goal_date: StudyDate,
}

impl LedgerState {
    /// Rebuild the session from the cached record, keeping a goal still in flight.
    fn supersede_session(&mut self) {
        let Some(record) = self.cache.get(self.session_date) else {
            return;
        };
        self.session.supersede(record, self.standing_goal);
        if let GoalSync::Pending(goal) = self.goal_sync {
            if self.goal_date == self.session_date {
                self.session.apply_goal(goal);
            }
        }
    }
}

pub struct ProgressLedger {
    api: Arc<dyn ProgressApi>,
    snapshots: Option<Arc<dyn SnapshotRepository>>,
    clock: Clock,
    state: Mutex<LedgerState>,
}

impl ProgressLedger {
    #[must_use]
    pub fn new(api: Arc<dyn ProgressApi>, clock: Clock, standing_goal: DailyGoal) -> Self {
        let today = clock.today();
        let state = LedgerState {
            cache: ProgressCache::new(),
            session: SessionProgressState::new(standing_goal),
            session_date: today,
            standing_goal,
            last_error: None,
            goal_seq: 0,
            goal_sync: GoalSync::Idle,
            goal_date: today,
        };
        Self {
            api,
            snapshots: None,
            clock,
            state: Mutex::new(state),
        }
    }

    /// Write fetched records through to an offline snapshot.
    #[must_use]
    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotRepository>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn session(&self) -> SessionProgressState {
        self.lock().session
    }

    #[must_use]
    pub fn session_date(&self) -> StudyDate {
        self.lock().session_date
    }

    #[must_use]
    pub fn standing_goal(&self) -> DailyGoal {
        self.lock().standing_goal
    }

    #[must_use]
    pub fn cached(&self, date: StudyDate) -> Option<ProgressRecord> {
        self.lock().cache.get(date).cloned()
    }

    /// Cached records in `from..=to`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Progress` if `from` is after `to`.
    pub fn cached_range(
        &self,
        from: StudyDate,
        to: StudyDate,
    ) -> Result<Vec<ProgressRecord>, LedgerError> {
        let state = self.lock();
        Ok(state
            .cache
            .range(from, to)?
            .into_iter()
            .cloned()
            .collect())
    }

    #[must_use]
    pub fn last_error(&self) -> Option<LedgerFailure> {
        self.lock().last_error.clone()
    }

    #[must_use]
    pub fn goal_sync(&self) -> GoalSync {
        self.lock().goal_sync.clone()
    }

    /// Adopt a new standing goal, e.g. after the profile loads.
    ///
    /// An in-flight goal edit keeps its optimistic value.
    pub fn set_standing_goal(&self, goal: DailyGoal) {
        let mut state = self.lock();
        state.standing_goal = goal;
        if matches!(state.goal_sync, GoalSync::Pending(_)) {
            return;
        }
        let effective = state
            .cache
            .get(state.session_date)
            .map_or(goal, |record| record.effective_goal(goal));
        state.session.apply_goal(effective);
    }

    pub fn set_queue(&self, due_count: u32, new_selected: u32) {
        self.lock().session.set_queue(due_count, new_selected);
    }

    /// Count a completed review locally. No request is made.
    pub fn record_review(&self, was_new: bool) {
        self.lock().session.record_review(was_new);
    }

    /// Fetch one day, today when `date` is `None`.
    ///
    /// Returns how many records were cached. On failure the cache is left as
    /// it was and the error is kept for [`ProgressLedger::last_error`].
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Api` for transport, status and decode failures, or
    /// `LedgerError::Progress` if the server returned records the cache refuses.
    pub async fn fetch(&self, date: Option<StudyDate>) -> Result<usize, LedgerError> {
        let today = self.clock.today();
        let date = date.unwrap_or(today);
        self.roll_over(today);
        self.read(ProgressQuery::Date(date)).await
    }

    /// Fetch every day in `from..=to`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Progress` without sending anything if `from` is after
    /// `to`; otherwise as [`ProgressLedger::fetch`].
    pub async fn fetch_range(&self, from: StudyDate, to: StudyDate) -> Result<usize, LedgerError> {
        if from > to {
            return Err(ProgressError::InvalidRange { from, to }.into());
        }
        self.read(ProgressQuery::Range { from, to }).await
    }

    /// Start a fresh session when the study day has moved on.
    fn roll_over(&self, today: StudyDate) {
        let mut state = self.lock();
        if state.session_date == today {
            return;
        }
        debug!(from = %state.session_date, to = %today, "study day rolled over");
        let (due, new) = (state.session.meta.due_count, state.session.meta.new_selected);
        let mut session = SessionProgressState::from_record(state.cache.get(today), state.standing_goal);
        session.set_queue(due, new);
        state.session_date = today;
        state.session = session;
    }

    async fn read(&self, query: ProgressQuery) -> Result<usize, LedgerError> {
        let items = match self.api.fetch_progress(query).await {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, ?query, "progress fetch failed");
                self.lock().last_error = Some(LedgerFailure::from_api(&err));
                return Err(err.into());
            }
        };

        {
            let mut state = self.lock();
            if let Err(err) = state.cache.replace(items.clone()) {
                warn!(error = %err, ?query, "progress fetch returned unusable records");
                state.last_error = Some(LedgerFailure::from_progress(&err));
                return Err(err.into());
            }
            state.last_error = None;
            let session_date = state.session_date;
            if items.iter().any(|r| r.date_utc() == session_date) {
                state.supersede_session();
                if matches!(state.goal_sync, GoalSync::Failed { .. }) {
                    state.goal_sync = GoalSync::Idle;
                }
            }
        }

        self.write_snapshot(&items).await;
        Ok(items.len())
    }

    /// Change today's goal.
    ///
    /// The session shows the new goal before the request is sent. Only
    /// `daily_goal` changes; review counters are left alone.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Progress` without sending anything if `value` is
    /// not a valid goal, or `LedgerError::Api` if the PATCH fails. A failed
    /// PATCH leaves the optimistic goal in place.
    pub async fn update_goal(&self, value: i64) -> Result<GoalUpdate, LedgerError> {
        let staged = self.stage_goal(value)?;
        self.sync_goal(staged).await
    }

    /// The local half of [`ProgressLedger::update_goal`]: validate the goal and
    /// show it in the session right away. The goal is staged for the clock's
    /// current day, starting a new session if the day has changed.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Progress` if `value` is not a valid goal; the
    /// session is unchanged.
    pub fn stage_goal(&self, value: i64) -> Result<StagedGoal, LedgerError> {
        let goal = DailyGoal::new(value)?;
        Ok(self.stage(goal))
    }

    fn stage(&self, goal: DailyGoal) -> StagedGoal {
        self.roll_over(self.clock.today());
        let mut state = self.lock();
        state.session.apply_goal(goal);
        state.goal_sync = GoalSync::Pending(goal);
        state.goal_seq += 1;
        state.goal_date = state.session_date;
        StagedGoal {
            date: state.session_date,
            goal,
            seq: state.goal_seq,
        }
    }

    /// Re-send a goal whose PATCH failed. Returns `None` when nothing is waiting.
    ///
    /// # Errors
    ///
    /// As [`ProgressLedger::update_goal`].
    pub async fn retry_goal_sync(&self) -> Result<Option<GoalUpdate>, LedgerError> {
        let GoalSync::Failed { goal, .. } = self.goal_sync() else {
            return Ok(None);
        };
        let staged = self.stage(goal);
        self.sync_goal(staged).await.map(Some)
    }

    /// Send a staged goal. A response that arrives after a newer goal was
    /// staged is dropped and reported as [`GoalUpdate::Superseded`].
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Api` if the PATCH fails.
    pub async fn sync_goal(&self, staged: StagedGoal) -> Result<GoalUpdate, LedgerError> {
        let StagedGoal { date, goal, seq } = staged;
        let patch = ProgressPatch::goal(goal);
        let result = self.api.patch_progress(date, &patch).await;

        let confirmed = {
            let mut state = self.lock();
            if seq != state.goal_seq {
                debug!(seq, latest = state.goal_seq, ok = result.is_ok(), "dropping stale goal response");
                return Ok(GoalUpdate::Superseded);
            }

            let ack = match result {
                Ok(ack) => ack,
                Err(err) => {
                    warn!(error = %err, %date, goal = goal.get(), "goal update failed");
                    let failure = LedgerFailure::from_api(&err);
                    state.last_error = Some(failure.clone());
                    state.goal_sync = GoalSync::Failed {
                        goal,
                        error: failure,
                    };
                    return Err(err.into());
                }
            };

            let record = match ack.item {
                Some(item) => Some(item),
                None => state.cache.get(date).cloned().and_then(|mut record| {
                    record.apply_patch(&patch, self.clock.now()).ok()?;
                    Some(record)
                }),
            };
            if let Some(record) = &record {
                if let Err(err) = state.cache.upsert(record.clone()) {
                    warn!(error = %err, %date, "confirmed goal record not cached");
                }
            }
            // A read may have landed while the PATCH was in flight.
            if date == state.session_date {
                state.session.apply_goal(goal);
            }
            state.goal_sync = GoalSync::Confirmed(goal);
            state.last_error = None;
            record
        };

        if let Some(record) = confirmed {
            self.write_snapshot(std::slice::from_ref(&record)).await;
        }
        Ok(GoalUpdate::Confirmed(goal))
    }

    /// Seed the cache from the offline snapshot. Days already fetched are kept.
    ///
    /// Returns how many records were loaded; snapshot failures are logged and count as zero.
    pub async fn hydrate(&self, user_id: UserId) -> usize {
        let Some(snapshots) = &self.snapshots else {
            return 0;
        };
        let to = self.lock().session_date;
        let from = to
            .as_naive()
            .checked_sub_days(Days::new(HYDRATE_DAYS))
            .map_or(to, StudyDate::new);

        let records = match snapshots.load_records(user_id, from, to).await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, %user_id, "progress snapshot unavailable");
                return 0;
            }
        };

        let mut state = self.lock();
        let fresh: Vec<ProgressRecord> = records
            .into_iter()
            .filter(|record| state.cache.get(record.date_utc()).is_none())
            .collect();
        match state.cache.replace(fresh) {
            Ok(count) => {
                state.supersede_session();
                count
            }
            Err(err) => {
                warn!(error = %err, %user_id, "progress snapshot ignored");
                0
            }
        }
    }

    async fn write_snapshot(&self, records: &[ProgressRecord]) {
        let Some(snapshots) = &self.snapshots else {
            return;
        };
        if records.is_empty() {
            return;
        }
        if let Err(err) = snapshots.save_records(records).await {
            warn!(error = %err, count = records.len(), "progress snapshot write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use chrono::Duration;
    use reqwest::StatusCode;
    use storage::repository::InMemoryRepository;
    use study_core::time::{fixed_clock, fixed_now};
    use tokio::sync::oneshot;

    use super::*;
    use crate::api::PatchAck;

    type PatchReply = Result<PatchAck, ApiError>;

    #[derive(Default)]
    struct FakeProgressApi {
        fetches: Mutex<VecDeque<Result<Vec<ProgressRecord>, ApiError>>>,
        patches: Mutex<VecDeque<oneshot::Receiver<PatchReply>>>,
        fetch_calls: Mutex<Vec<ProgressQuery>>,
        patch_calls: Mutex<Vec<(StudyDate, ProgressPatch)>>,
    }

    impl FakeProgressApi {
        fn reply_fetch(&self, reply: Result<Vec<ProgressRecord>, ApiError>) {
            self.fetches.lock().unwrap().push_back(reply);
        }

        fn reply_patch(&self, reply: PatchReply) {
            let (tx, rx) = oneshot::channel();
            tx.send(reply).ok();
            self.patches.lock().unwrap().push_back(rx);
        }

        /// Queue a PATCH whose reply is released later through the sender.
        fn hold_patch(&self) -> oneshot::Sender<PatchReply> {
            let (tx, rx) = oneshot::channel();
            self.patches.lock().unwrap().push_back(rx);
            tx
        }

        fn fetch_calls(&self) -> Vec<ProgressQuery> {
            self.fetch_calls.lock().unwrap().clone()
        }

        fn patch_calls(&self) -> Vec<(StudyDate, ProgressPatch)> {
            self.patch_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProgressApi for FakeProgressApi {
        async fn fetch_progress(
            &self,
            query: ProgressQuery,
        ) -> Result<Vec<ProgressRecord>, ApiError> {
            self.fetch_calls.lock().unwrap().push(query);
            let reply = self.fetches.lock().unwrap().pop_front();
            reply.unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn patch_progress(
            &self,
            date: StudyDate,
            patch: &ProgressPatch,
        ) -> Result<PatchAck, ApiError> {
            self.patch_calls.lock().unwrap().push((date, *patch));
            let pending = self.patches.lock().unwrap().pop_front();
            match pending {
                Some(rx) => rx.await.unwrap_or(Err(ApiError::NotAcknowledged)),
                None => Ok(PatchAck { ok: true, item: None }),
            }
        }
    }

    fn today() -> StudyDate {
        StudyDate::of(fixed_now())
    }

    fn goal(value: i64) -> DailyGoal {
        DailyGoal::new(value).unwrap()
    }

    fn record(user: UserId, date: StudyDate, reviews_done: u32) -> ProgressRecord {
        let mut record = ProgressRecord::new(user, date, fixed_now());
        record
            .apply_patch(
                &ProgressPatch {
                    reviews_done: Some(reviews_done),
                    ..ProgressPatch::default()
                },
                fixed_now(),
            )
            .unwrap();
        record
    }

    fn ledger(api: &Arc<FakeProgressApi>) -> ProgressLedger {
        let api: Arc<dyn ProgressApi> = api.clone();
        ProgressLedger::new(api, fixed_clock(), goal(20))
    }

    fn server_error() -> ApiError {
        ApiError::HttpStatus(StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[tokio::test]
    async fn fetch_today_caches_and_supersedes_session() {
        let api = Arc::new(FakeProgressApi::default());
        let user = UserId::random();
        api.reply_fetch(Ok(vec![record(user, today(), 5)]));
        let ledger = ledger(&api);

        assert_eq!(ledger.fetch(None).await.unwrap(), 1);

        assert_eq!(api.fetch_calls(), vec![ProgressQuery::Date(today())]);
        assert_eq!(ledger.cached(today()).unwrap().reviews_done(), 5);
        let session = ledger.session();
        assert_eq!(session.meta.reviews_done_today, 5);
        assert_eq!(session.session_progress, 5);
        assert_eq!(session.meta.daily_goal, goal(20));
        assert_eq!(ledger.last_error(), None);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_cache_and_reports_error() {
        let api = Arc::new(FakeProgressApi::default());
        let user = UserId::random();
        api.reply_fetch(Ok(vec![record(user, today(), 5)]));
        api.reply_fetch(Err(server_error()));
        api.reply_fetch(Ok(vec![record(user, today(), 6)]));
        let ledger = ledger(&api);

        ledger.fetch(None).await.unwrap();
        let err = ledger.fetch(None).await.unwrap_err();

        assert!(matches!(err, LedgerError::Api(ApiError::HttpStatus(_))));
        assert_eq!(ledger.cached(today()).unwrap().reviews_done(), 5);
        assert_eq!(ledger.last_error().unwrap().status, Some(500));

        ledger.fetch(None).await.unwrap();
        assert_eq!(ledger.last_error(), None);
        assert_eq!(ledger.session().session_progress, 6);
    }

    #[tokio::test]
    async fn goal_update_moves_only_the_denominator() {
        let api = Arc::new(FakeProgressApi::default());
        api.reply_fetch(Ok(vec![record(UserId::random(), today(), 10)]));
        let ledger = ledger(&api);
        ledger.fetch(None).await.unwrap();
        assert_eq!(ledger.session().percent(), 50);

        let outcome = ledger.update_goal(25).await.unwrap();

        assert_eq!(outcome, GoalUpdate::Confirmed(goal(25)));
        let session = ledger.session();
        assert_eq!(session.meta.daily_goal, goal(25));
        assert_eq!(session.meta.reviews_done_today, 10);
        assert_eq!(session.session_progress, 10);
        assert_eq!(session.percent(), 40);
        assert_eq!(api.patch_calls(), vec![(today(), ProgressPatch::goal(goal(25)))]);
        assert_eq!(ledger.cached(today()).unwrap().goal_override(), Some(goal(25)));
        assert_eq!(ledger.goal_sync(), GoalSync::Confirmed(goal(25)));
    }

    #[tokio::test]
    async fn staged_goal_shows_before_the_request() {
        let api = Arc::new(FakeProgressApi::default());
        let ledger = ledger(&api);

        let staged = ledger.stage_goal(35).unwrap();

        assert_eq!(staged.goal(), goal(35));
        assert_eq!(ledger.session().meta.daily_goal, goal(35));
        assert_eq!(ledger.goal_sync(), GoalSync::Pending(goal(35)));
        assert!(api.patch_calls().is_empty());

        let outcome = ledger.sync_goal(staged).await.unwrap();
        assert_eq!(outcome, GoalUpdate::Confirmed(goal(35)));
        assert_eq!(api.patch_calls().len(), 1);
    }

    #[tokio::test]
    async fn invalid_goal_never_reaches_the_server() {
        let api = Arc::new(FakeProgressApi::default());
        let ledger = ledger(&api);

        for value in [0, -3] {
            let err = ledger.update_goal(value).await.unwrap_err();
            assert!(matches!(
                err,
                LedgerError::Progress(ProgressError::NonPositiveGoal(_))
            ));
        }

        assert!(api.patch_calls().is_empty());
        assert_eq!(ledger.session().meta.daily_goal, goal(20));
        assert_eq!(ledger.goal_sync(), GoalSync::Idle);
    }

    #[tokio::test]
    async fn failed_goal_patch_keeps_optimistic_goal_until_next_read() {
        let api = Arc::new(FakeProgressApi::default());
        let user = UserId::random();
        api.reply_patch(Err(server_error()));
        api.reply_fetch(Ok(vec![record(user, today(), 3)]));
        let ledger = ledger(&api);

        assert!(ledger.update_goal(30).await.is_err());

        assert_eq!(ledger.session().meta.daily_goal, goal(30));
        assert!(matches!(
            ledger.goal_sync(),
            GoalSync::Failed { goal: g, .. } if g == goal(30)
        ));
        assert_eq!(ledger.last_error().unwrap().status, Some(500));

        ledger.fetch(None).await.unwrap();
        assert_eq!(ledger.session().meta.daily_goal, goal(20));
        assert_eq!(ledger.goal_sync(), GoalSync::Idle);
    }

    #[tokio::test]
    async fn read_during_goal_patch_keeps_the_new_goal() {
        let api = Arc::new(FakeProgressApi::default());
        api.reply_fetch(Ok(vec![record(UserId::random(), today(), 10)]));
        let ledger = ledger(&api);

        let staged = ledger.stage_goal(30).unwrap();
        ledger.fetch(None).await.unwrap();

        let session = ledger.session();
        assert_eq!(session.meta.daily_goal, goal(30));
        assert_eq!(session.meta.reviews_done_today, 10);

        let outcome = ledger.sync_goal(staged).await.unwrap();

        assert_eq!(outcome, GoalUpdate::Confirmed(goal(30)));
        assert_eq!(ledger.session().meta.daily_goal, goal(30));
        assert_eq!(ledger.cached(today()).unwrap().goal_override(), Some(goal(30)));
        assert_eq!(ledger.goal_sync(), GoalSync::Confirmed(goal(30)));
    }

    #[tokio::test]
    async fn goal_set_after_midnight_targets_the_new_day() {
        let api = Arc::new(FakeProgressApi::default());
        api.reply_fetch(Ok(vec![record(UserId::random(), today(), 10)]));
        let mut ledger = ledger(&api);
        ledger.fetch(None).await.unwrap();

        ledger.clock.advance(Duration::hours(12));
        ledger.update_goal(25).await.unwrap();

        let tomorrow = today().succ().unwrap();
        assert_eq!(api.patch_calls(), vec![(tomorrow, ProgressPatch::goal(goal(25)))]);
        assert_eq!(ledger.session_date(), tomorrow);
        let session = ledger.session();
        assert_eq!(session.meta.daily_goal, goal(25));
        assert_eq!(session.meta.reviews_done_today, 0);
        assert_eq!(ledger.cached(today()).unwrap().goal_override(), None);
    }

    #[tokio::test]
    async fn retry_resends_the_failed_goal() {
        let api = Arc::new(FakeProgressApi::default());
        api.reply_patch(Err(server_error()));
        let ledger = ledger(&api);

        assert_eq!(ledger.retry_goal_sync().await.unwrap(), None);
        assert!(ledger.update_goal(30).await.is_err());

        let outcome = ledger.retry_goal_sync().await.unwrap();

        assert_eq!(outcome, Some(GoalUpdate::Confirmed(goal(30))));
        assert_eq!(api.patch_calls().len(), 2);
        assert_eq!(ledger.goal_sync(), GoalSync::Confirmed(goal(30)));
        assert_eq!(ledger.last_error(), None);
    }

    #[tokio::test]
    async fn stale_goal_response_is_dropped() {
        let api = Arc::new(FakeProgressApi::default());
        let first = api.hold_patch();
        let second = api.hold_patch();
        let ledger = ledger(&api);

        let release = async {
            tokio::task::yield_now().await;
            second.send(Ok(PatchAck { ok: true, item: None })).ok();
            tokio::task::yield_now().await;
            first.send(Err(server_error())).ok();
        };
        let (older, newer, ()) =
            tokio::join!(ledger.update_goal(25), ledger.update_goal(30), release);

        assert_eq!(older.unwrap(), GoalUpdate::Superseded);
        assert_eq!(newer.unwrap(), GoalUpdate::Confirmed(goal(30)));
        assert_eq!(ledger.session().meta.daily_goal, goal(30));
        assert_eq!(ledger.goal_sync(), GoalSync::Confirmed(goal(30)));
        assert_eq!(ledger.last_error(), None);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_sending() {
        let api = Arc::new(FakeProgressApi::default());
        let ledger = ledger(&api);
        let later = today().succ().unwrap();

        let err = ledger.fetch_range(later, today()).await.unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Progress(ProgressError::InvalidRange { .. })
        ));
        assert!(api.fetch_calls().is_empty());
    }

    #[tokio::test]
    async fn fetch_range_keeps_other_days() {
        let api = Arc::new(FakeProgressApi::default());
        let user = UserId::random();
        let yesterday = StudyDate::from_ymd(2025, 1, 14).unwrap();
        api.reply_fetch(Ok(vec![record(user, today(), 1)]));
        api.reply_fetch(Ok(vec![record(user, yesterday, 9)]));
        let ledger = ledger(&api);

        ledger.fetch(None).await.unwrap();
        ledger.fetch_range(yesterday, yesterday).await.unwrap();

        let cached = ledger.cached_range(yesterday, today()).unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(ledger.session().session_progress, 1);
    }

    #[tokio::test]
    async fn records_from_another_user_are_refused() {
        let api = Arc::new(FakeProgressApi::default());
        api.reply_fetch(Ok(vec![record(UserId::random(), today(), 1)]));
        api.reply_fetch(Ok(vec![record(UserId::random(), today(), 7)]));
        let ledger = ledger(&api);

        ledger.fetch(None).await.unwrap();
        let err = ledger.fetch(None).await.unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Progress(ProgressError::ForeignRecord { .. })
        ));
        assert_eq!(ledger.cached(today()).unwrap().reviews_done(), 1);
        assert!(ledger.last_error().is_some());
    }

    #[tokio::test]
    async fn fetched_records_are_written_through_and_hydrate_later() {
        let api = Arc::new(FakeProgressApi::default());
        let user = UserId::random();
        api.reply_fetch(Ok(vec![record(user, today(), 4)]));
        let snapshots = Arc::new(InMemoryRepository::new());

        ledger(&api)
            .with_snapshots(snapshots.clone())
            .fetch(None)
            .await
            .unwrap();

        let offline = ledger(&Arc::new(FakeProgressApi::default())).with_snapshots(snapshots);
        assert_eq!(offline.hydrate(user).await, 1);
        assert_eq!(offline.session().session_progress, 4);
    }

    #[tokio::test]
    async fn standing_goal_applies_unless_the_day_is_overridden() {
        let api = Arc::new(FakeProgressApi::default());
        let ledger = ledger(&api);

        ledger.set_standing_goal(goal(40));
        assert_eq!(ledger.session().meta.daily_goal, goal(40));

        let mut overridden = record(UserId::random(), today(), 2);
        overridden
            .apply_patch(&ProgressPatch::goal(goal(15)), fixed_now())
            .unwrap();
        api.reply_fetch(Ok(vec![overridden]));
        ledger.fetch(None).await.unwrap();
        ledger.set_standing_goal(goal(50));

        assert_eq!(ledger.standing_goal(), goal(50));
        assert_eq!(ledger.session().meta.daily_goal, goal(15));
    }

    #[tokio::test]
    async fn reviews_count_locally() {
        let api = Arc::new(FakeProgressApi::default());
        let ledger = ledger(&api);
        ledger.set_queue(3, 2);

        ledger.record_review(true);
        ledger.record_review(false);

        let session = ledger.session();
        assert_eq!(session.session_progress, 2);
        assert_eq!(session.meta.reviews_done_today, 2);
        assert_eq!(session.meta.due_count, 2);
        assert_eq!(session.meta.new_selected, 1);
        assert!(api.fetch_calls().is_empty());
        assert!(api.patch_calls().is_empty());
    }
}

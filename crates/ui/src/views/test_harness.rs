use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{
    ApiError, Clock, LocaleEnvironment, LocaleService, PatchAck, ProfileApi, ProfileService,
    ProgressApi, ProgressLedger, ProgressQuery,
};
use storage::repository::Storage;
use study_core::Lang;
use study_core::model::{
    DailyGoal, Profile, ProfileUpdateCommand, ProgressPatch, ProgressRecord, StudyDate, UserId,
};
use study_core::time::fixed_now;

use crate::context::{UiApp, build_app_context};
use crate::routes::Route;
use crate::views::{ProfileView, ProgressView};

/// Canned study API: serves `items` and `profile`, or fails every read.
pub struct FakeStudyApi {
    pub items: Mutex<Vec<ProgressRecord>>,
    pub profile: Profile,
    pub fail_reads: bool,
}

impl FakeStudyApi {
    pub fn new(profile: Profile) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            profile,
            fail_reads: false,
        }
    }
}

#[async_trait]
impl ProgressApi for FakeStudyApi {
    async fn fetch_progress(&self, _query: ProgressQuery) -> Result<Vec<ProgressRecord>, ApiError> {
        if self.fail_reads {
            return Err(ApiError::NotAcknowledged);
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn patch_progress(
        &self,
        _date: StudyDate,
        _patch: &ProgressPatch,
    ) -> Result<PatchAck, ApiError> {
        Ok(PatchAck {
            ok: true,
            item: None,
        })
    }
}

#[async_trait]
impl ProfileApi for FakeStudyApi {
    async fn get_profile(&self) -> Result<Profile, ApiError> {
        if self.fail_reads {
            return Err(ApiError::NotAcknowledged);
        }
        Ok(self.profile.clone())
    }

    async fn patch_profile(&self, _command: &ProfileUpdateCommand) -> Result<(), ApiError> {
        Ok(())
    }
}

struct TestApp {
    ledger: Arc<ProgressLedger>,
    profiles: Arc<ProfileService>,
    locale: Arc<LocaleService>,
    lang: Lang,
}

impl UiApp for TestApp {
    fn ledger(&self) -> Arc<ProgressLedger> {
        Arc::clone(&self.ledger)
    }

    fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    fn locale(&self) -> Arc<LocaleService> {
        Arc::clone(&self.locale)
    }

    fn lang(&self) -> Lang {
        self.lang
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Progress,
    Profile,
    Shell,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    match props.view {
        ViewKind::Shell => rsx! { Router::<Route> {} },
        ViewKind::Progress | ViewKind::Profile => rsx! { Router::<TestRoute> {} },
    }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Progress => rsx! { ProgressView {} },
        ViewKind::Profile | ViewKind::Shell => rsx! { ProfileView {} },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub ledger: Arc<ProgressLedger>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn test_profile() -> Profile {
    Profile {
        user_id: UserId::random(),
        display_name: Some("Ada".into()),
        daily_goal: DailyGoal::new(20).unwrap(),
        locale: None,
        timezone: Some("UTC".into()),
    }
}

pub fn setup_view_harness(view: ViewKind, api: FakeStudyApi, lang: Lang) -> ViewHarness {
    let storage = Storage::in_memory();
    let api = Arc::new(api);
    let standing_goal = api.profile.daily_goal;
    let progress_api: Arc<dyn ProgressApi> = api.clone();
    let profile_api: Arc<dyn ProfileApi> = api;

    let ledger = Arc::new(
        ProgressLedger::new(progress_api, Clock::fixed(fixed_now()), standing_goal)
            .with_snapshots(Arc::clone(&storage.snapshots)),
    );
    let profiles = Arc::new(
        ProfileService::new(profile_api)
            .with_snapshots(Arc::clone(&storage.snapshots))
            .with_ledger(Arc::clone(&ledger)),
    );
    let locale = Arc::new(LocaleService::new(
        Arc::clone(&storage.preferences),
        LocaleEnvironment::default(),
    ));

    let app = Arc::new(TestApp {
        ledger: Arc::clone(&ledger),
        profiles,
        locale,
        lang,
    });
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness { dom, ledger }
}

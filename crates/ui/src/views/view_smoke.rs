use dioxus::prelude::*;
use study_core::Lang;
use study_core::model::{
    DailyGoal, ProgressPatch, ProgressRecord, SessionProgressState, StudyDate, UserId,
};
use study_core::time::fixed_now;

use super::test_harness::{FakeStudyApi, ViewKind, setup_view_harness, test_profile};
use crate::views::GoalProgressCard;
use crate::vm::map_goal_progress;

fn record_with_reviews(user_id: UserId, reviews_done: u32) -> ProgressRecord {
    let mut record = ProgressRecord::new(user_id, StudyDate::of(fixed_now()), fixed_now());
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

#[tokio::test(flavor = "current_thread")]
async fn progress_view_smoke_renders_fetched_progress() {
    let profile = test_profile();
    let api = FakeStudyApi::new(profile.clone());
    api.items
        .lock()
        .unwrap()
        .push(record_with_reviews(profile.user_id, 10));
    let mut harness = setup_view_harness(ViewKind::Progress, api, Lang::En);

    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;

    let html = harness.render();
    assert!(html.contains("50%"), "missing percent in {html}");
    assert!(html.contains("10 / 20 reviews"), "missing counts in {html}");
    assert!(html.contains("10 to go"), "missing remaining in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn progress_view_smoke_keeps_rendering_when_fetch_fails() {
    let mut api = FakeStudyApi::new(test_profile());
    api.fail_reads = true;
    let mut harness = setup_view_harness(ViewKind::Progress, api, Lang::En);

    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;

    let html = harness.render();
    assert!(html.contains("Something went wrong"), "missing notice in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
    assert!(html.contains("0 / 20 reviews"), "missing card in {html}");
    assert!(harness.ledger.last_error().is_some());
}

#[test]
fn goal_card_smoke_caps_bar_but_not_percent() {
    let mut state = SessionProgressState::new(DailyGoal::new(4).unwrap());
    for _ in 0..5 {
        state.record_review(false);
    }
    let progress = map_goal_progress(&state);

    let html = dioxus_ssr::render_element(rsx! { GoalProgressCard { progress } });

    assert!(html.contains("125%"), "missing percent in {html}");
    assert!(html.contains("width: 100%"), "bar not capped in {html}");
    assert!(html.contains("goal-card--met"), "missing met class in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn profile_view_smoke_renders_grapheme_counter() {
    let mut harness = setup_view_harness(
        ViewKind::Profile,
        FakeStudyApi::new(test_profile()),
        Lang::En,
    );

    harness.rebuild();
    harness.drive_async().await;
    harness.drive_async().await;

    let html = harness.render();
    assert!(html.contains("Display name"), "missing label in {html}");
    assert!(html.contains("3/50"), "missing counter in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn shell_smoke_uses_resolved_language() {
    let mut harness = setup_view_harness(
        ViewKind::Shell,
        FakeStudyApi::new(test_profile()),
        Lang::Pl,
    );

    harness.rebuild();
    harness.drive_async().await;

    let html = harness.render();
    let copy = Lang::Pl.copy();
    assert!(html.contains(copy.footer), "missing footer in {html}");
    assert!(html.contains("lang-option--active"), "missing switch in {html}");
    assert!(html.contains(copy.nav_progress), "missing nav label in {html}");
    assert!(html.contains(copy.nav_profile), "missing nav label in {html}");
    assert!(!html.contains(">Progress<"), "english nav label in {html}");
}

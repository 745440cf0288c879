use dioxus::prelude::*;
use services::LedgerError;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    GoalProgressVm, GoalSyncVm, goal_error_message, map_goal_progress, map_goal_sync,
    parse_goal_input,
};

/// Outcome of the initial read. A failed read still renders cached progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FetchNotice(Option<ViewError>);

#[component]
pub fn ProgressView() -> Element {
    let ctx = use_context::<AppContext>();
    let ledger = ctx.ledger();
    let mut revision = use_signal(|| 0_u32);
    let mut goal_input = use_signal(String::new);
    let mut goal_error = use_signal(|| None::<String>);

    let ledger_for_resource = ledger.clone();
    let resource = use_resource(move || {
        let ledger = ledger_for_resource.clone();
        async move {
            let notice = match ledger.fetch(None).await {
                Ok(_) => None,
                Err(LedgerError::Api(err)) => Some(ViewError::from_api(&err)),
                Err(_) => Some(ViewError::Unknown),
            };
            Ok::<_, ViewError>(FetchNotice(notice))
        }
    });

    let state = view_state_from_resource(&resource);
    // Ledger state is read directly; `revision` re-renders after local changes.
    let _ = revision();
    let progress = map_goal_progress(&ledger.session());
    let sync = map_goal_sync(&ledger.goal_sync());

    let ledger_for_submit = ledger.clone();
    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let staged = match parse_goal_input(&goal_input()) {
            Ok(value) => ledger_for_submit.stage_goal(value),
            Err(_) => {
                goal_error.set(Some("Enter a whole number.".to_string()));
                return;
            }
        };
        let staged = match staged {
            Ok(staged) => staged,
            Err(err) => {
                goal_error.set(Some(goal_error_message(&err)));
                return;
            }
        };
        goal_error.set(None);
        goal_input.set(String::new());
        *revision.write() += 1;

        let ledger = ledger_for_submit.clone();
        spawn(async move {
            if let Err(err) = ledger.sync_goal(staged).await {
                goal_error.set(Some(goal_error_message(&err)));
            }
            *revision.write() += 1;
        });
    };

    let ledger_for_retry = ledger.clone();
    let on_retry_sync = move |_| {
        let ledger = ledger_for_retry.clone();
        *revision.write() += 1;
        spawn(async move {
            if let Err(err) = ledger.retry_goal_sync().await {
                goal_error.set(Some(goal_error_message(&err)));
            }
            *revision.write() += 1;
        });
    };

    rsx! {
        div { class: "page progress-page",
            header { class: "view-header",
                h2 { class: "view-title", "Today" }
                p { class: "view-subtitle", "{ledger.session_date()}" }
            }
            div { class: "view-divider" }
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Error(err) => rsx! {
                    p { "{err.message()}" }
                },
                ViewState::Ready(FetchNotice(notice)) => rsx! {
                    if let Some(err) = notice {
                        div { class: "notice notice--warning",
                            span { "{err.message()}" }
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| {
                                    let mut resource = resource;
                                    resource.restart();
                                },
                                "Retry"
                            }
                        }
                    }
                    GoalProgressCard { progress: progress.clone() }
                },
            }
            form { class: "goal-form", onsubmit: on_submit,
                label { r#for: "daily-goal", "Daily goal" }
                input {
                    id: "daily-goal",
                    r#type: "number",
                    min: "1",
                    placeholder: "{progress.goal}",
                    value: "{goal_input}",
                    oninput: move |evt| goal_input.set(evt.value()),
                }
                button { class: "btn btn-primary", r#type: "submit", "Set goal" }
            }
            if let Some(message) = goal_error() {
                p { class: "form-error", "{message}" }
            }
            match sync {
                GoalSyncVm::Hidden => rsx! {},
                GoalSyncVm::Saving => rsx! {
                    p { class: "sync-status", "Saving..." }
                },
                GoalSyncVm::Saved => rsx! {
                    p { class: "sync-status sync-status--ok", "Saved" }
                },
                GoalSyncVm::Failed(label) => rsx! {
                    div { class: "sync-status sync-status--failed",
                        span { "{label}" }
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: on_retry_sync,
                            "Try again"
                        }
                    }
                },
            }
        }
    }
}

#[component]
pub fn GoalProgressCard(progress: GoalProgressVm) -> Element {
    let card_class = if progress.goal_met {
        "goal-card goal-card--met"
    } else {
        "goal-card"
    };

    rsx! {
        section { class: "{card_class}",
            div { class: "goal-card-header",
                h3 { "Daily goal" }
                span { class: "goal-card-percent", "{progress.percent}%" }
            }
            div { class: "goal-bar",
                div { class: "goal-bar-fill", style: "width: {progress.bar_percent}%" }
            }
            p { class: "goal-card-count", "{progress.done} / {progress.goal} reviews" }
            p { class: "goal-card-remaining", "{progress.remaining_label}" }
            p { class: "goal-card-queue", "{progress.queue_label}" }
        }
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use services::ProfileServiceError;
use study_core::Lang;
use study_core::model::Profile;
use study_core::text::GraphemeCounter;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{ProfileFormVm, map_name_counter, profile_error_message, profile_outcome_message};

#[derive(Clone, Debug, PartialEq, Eq)]
enum SaveStatus {
    Saving,
    Done(&'static str),
    Failed(String),
}

#[component]
pub fn ProfileView() -> Element {
    let ctx = use_context::<AppContext>();
    let profiles = ctx.profiles();

    let resource = use_resource(move || {
        let profiles = profiles.clone();
        async move {
            if let Some(profile) = profiles.current() {
                return Ok(profile);
            }
            match profiles.load().await {
                Ok(profile) => Ok(profile),
                Err(ProfileServiceError::Api(err)) => profiles
                    .cached_offline()
                    .await
                    .ok_or_else(|| ViewError::from_api(&err)),
                Err(_) => Err(ViewError::Unknown),
            }
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page profile-page",
            header { class: "view-header",
                h2 { class: "view-title", "Profile" }
            }
            div { class: "view-divider" }
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(profile) => rsx! {
                    ProfileForm { profile }
                },
                ViewState::Error(err) => rsx! {
                    p { "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| {
                            let mut resource = resource;
                            resource.restart();
                        },
                        "Retry"
                    }
                },
            }
        }
    }
}

#[component]
fn ProfileForm(profile: Profile) -> Element {
    let ctx = use_context::<AppContext>();
    let profiles = ctx.profiles();
    let mut form = use_signal(|| ProfileFormVm::from_profile(&profile));
    let mut original = use_signal(|| profile.clone());
    let mut status = use_signal(|| None::<SaveStatus>);
    // Memoizes on the last name, so re-renders for other fields cost nothing.
    let counter = use_hook(|| Rc::new(RefCell::new(GraphemeCounter::new())));

    let name_counter = map_name_counter(&mut counter.borrow_mut(), &form.read().display_name);
    let counter_class = if name_counter.over_limit {
        "field-counter field-counter--over"
    } else {
        "field-counter"
    };
    let locale_code = form.read().locale.map_or("", Lang::code);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let payload = form.read().changes_from(&original.read());
        let profiles = profiles.clone();
        status.set(Some(SaveStatus::Saving));
        spawn(async move {
            match profiles.update(&payload).await {
                Ok(outcome) => {
                    if let Some(current) = profiles.current() {
                        form.set(ProfileFormVm::from_profile(&current));
                        original.set(current);
                    }
                    status.set(Some(SaveStatus::Done(profile_outcome_message(&outcome))));
                }
                Err(err) => status.set(Some(SaveStatus::Failed(profile_error_message(&err)))),
            }
        });
    };

    rsx! {
        form { class: "profile-form", onsubmit: on_submit,
            div { class: "field",
                label { r#for: "display-name", "Display name" }
                input {
                    id: "display-name",
                    r#type: "text",
                    value: "{form.read().display_name}",
                    oninput: move |evt| form.write().display_name = evt.value(),
                }
                span { class: "{counter_class}", "{name_counter.label}" }
            }
            div { class: "field",
                label { r#for: "profile-goal", "Daily goal" }
                input {
                    id: "profile-goal",
                    r#type: "number",
                    min: "1",
                    value: "{form.read().daily_goal}",
                    oninput: move |evt| form.write().daily_goal = evt.value(),
                }
            }
            div { class: "field",
                label { r#for: "profile-locale", "Language" }
                select {
                    id: "profile-locale",
                    value: "{locale_code}",
                    onchange: move |evt| form.write().locale = evt.value().parse().ok(),
                    option { value: "", "Not set" }
                    for lang in Lang::ALL {
                        option { value: "{lang.code()}", "{lang.code()}" }
                    }
                }
            }
            div { class: "field",
                label { r#for: "profile-timezone", "Time zone" }
                input {
                    id: "profile-timezone",
                    r#type: "text",
                    placeholder: "Europe/Warsaw",
                    value: "{form.read().timezone}",
                    oninput: move |evt| form.write().timezone = evt.value(),
                }
            }
            button {
                class: "btn btn-primary",
                r#type: "submit",
                disabled: matches!(status(), Some(SaveStatus::Saving)),
                "Save"
            }
            match status() {
                None => rsx! {},
                Some(SaveStatus::Saving) => rsx! {
                    p { class: "sync-status", "Saving..." }
                },
                Some(SaveStatus::Done(message)) => rsx! {
                    p { class: "sync-status sync-status--ok", "{message}" }
                },
                Some(SaveStatus::Failed(message)) => rsx! {
                    p { class: "form-error", "{message}" }
                },
            }
        }
    }
}

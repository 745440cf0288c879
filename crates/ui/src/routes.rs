use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};
use study_core::Lang;

use crate::context::AppContext;
use crate::views::{ProfileView, ProgressView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", ProgressView)] Progress {},
        #[route("/profile", ProfileView)] Profile {},
}

#[component]
fn Layout() -> Element {
    let ctx = use_context::<AppContext>();
    use_context_provider(|| Signal::new(ctx.initial_lang()));

    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let lang = use_context::<Signal<Lang>>();
    let copy = lang().copy();

    rsx! {
        nav { class: "sidebar",
            h1 { "{copy.brand}" }
            ul {
                li { Link { to: Route::Progress {}, "{copy.nav_progress}" } }
                li { Link { to: Route::Profile {}, "{copy.nav_profile}" } }
            }
            LangSwitch {}
            footer { class: "sidebar-footer", "{copy.footer}" }
        }
    }
}

#[component]
fn LangSwitch() -> Element {
    let ctx = use_context::<AppContext>();
    let mut lang = use_context::<Signal<Lang>>();
    let current = lang();

    rsx! {
        div { class: "lang-switch",
            for option in Lang::ALL {
                button {
                    class: if option == current { "lang-option lang-option--active" } else { "lang-option" },
                    r#type: "button",
                    disabled: option == current,
                    onclick: {
                        let locale = ctx.locale();
                        move |_| {
                            lang.set(option);
                            let locale = locale.clone();
                            spawn(async move {
                                if let Err(err) = locale.set_lang(option).await {
                                    tracing::warn!(error = %err, lang = %option, "language choice not saved");
                                }
                            });
                        }
                    },
                    "{option.code().to_uppercase()}"
                }
            }
        }
    }
}

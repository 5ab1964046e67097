//! Lexdesk Client - demo shell
//!
//! Shows the signed-in user's live notifications in a paginated `DataTable`.
//! Supports both web (WASM) and desktop platforms.

#![allow(non_snake_case)]

use dioxus::prelude::*;
use lexdesk_client::realtime::use_user_notifications;
use lexdesk_client::table::{Column, DataTable, Pagination, Record, TableColumn};
use lexdesk_client::{AuthContext, AuthProvider};
use serde_json::Value;

const MAIN_CSS: Asset = asset!("/assets/main.css");

const PER_PAGE: u32 = 10;

fn main() {
    // Initialize tracing for desktop
    #[cfg(not(target_arch = "wasm32"))]
    {
        use tracing_subscriber::EnvFilter;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("lexdesk_client=debug")),
            )
            .init();
    }

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        AuthProvider {
            main { class: "mx-auto max-w-4xl p-6 space-y-4",
                h1 { class: "text-xl font-semibold", "Notifications" }
                Shell {}
            }
        }
    }
}

#[component]
fn Shell() -> Element {
    let auth = use_context::<AuthContext>();

    if auth.is_authenticated() {
        let user_id = option_env!("LEXDESK_USER_ID").unwrap_or("1").to_string();
        rsx! { NotificationFeed { user_id } }
    } else {
        rsx! { TokenForm {} }
    }
}

#[component]
fn TokenForm() -> Element {
    let mut auth = use_context::<AuthContext>();
    let mut token = use_signal(String::new);

    rsx! {
        form {
            class: "flex gap-2",
            onsubmit: move |evt| {
                evt.prevent_default();
                let value = token.read().trim().to_string();
                if !value.is_empty() {
                    auth.login(value);
                }
            },
            input {
                class: "flex-1 rounded-md border border-slate-300 px-3 py-2 text-sm",
                r#type: "password",
                placeholder: "API token",
                value: "{token}",
                oninput: move |evt| token.set(evt.value()),
            }
            button { class: "rounded-md bg-slate-900 px-4 py-2 text-sm text-white", r#type: "submit", "Sign in" }
        }
    }
}

#[component]
fn NotificationFeed(user_id: String) -> Element {
    let mut auth = use_context::<AuthContext>();
    let notifications = use_user_notifications(&user_id);
    let mut page = use_signal(|| 1u32);

    let records: Vec<Record> = notifications
        .read()
        .iter()
        .rev()
        .filter_map(|n| match n.to_value() {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    let total_pages = (records.len() as u32).div_ceil(PER_PAGE);
    let current = page().clamp(1, total_pages.max(1));
    let start = ((current - 1) * PER_PAGE) as usize;
    let visible: Vec<Record> = records
        .into_iter()
        .skip(start)
        .take(PER_PAGE as usize)
        .collect();

    rsx! {
        div { class: "flex items-center justify-between text-sm text-slate-500",
            span { "Listening on user.{user_id}" }
            button { class: "underline", onclick: move |_| auth.logout(), "Sign out" }
        }
        DataTable {
            columns: notification_columns(),
            data: visible,
            pagination: Pagination::Paginated {
                current_page: current,
                per_page: PER_PAGE,
                total_pages,
                on_page_change: EventHandler::new(move |p| page.set(p)),
            },
            empty_state_message: "No notifications yet.",
        }
    }
}

fn notification_columns() -> Vec<TableColumn> {
    vec![
        Column::accessor("receivedAt", "Received"),
        Column::custom("text", "Message", |value: &Value, _row: &Record| {
            let text = value.as_str().unwrap_or("(no text)").to_string();
            rsx! { span { class: "font-medium", "{text}" } }
        })
        .sortable(false),
        Column::accessor("type", "Type"),
    ]
}

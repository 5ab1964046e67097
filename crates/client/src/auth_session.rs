//! Bearer-token session helpers.
//!
//! The token lives in the realtime manager's [`TokenStore`] under
//! `BroadcastConfig::token_key`. Every change goes through [`login`] or
//! [`logout`], both of which reset the manager so the next
//! `get_connection()` is bound to the new token.

use dioxus::prelude::*;

use crate::api_client::ApiClient;
use crate::realtime::{self, RealtimeManager};
use crate::storage::TokenStore;

/// Store `token` and drop any connection made with the previous one.
pub fn login(manager: &RealtimeManager, token: &str) -> bool {
    let stored = manager
        .storage()
        .set_item(&manager.config().token_key, token);
    if !stored {
        crate::log_error!("Failed to persist auth token");
    }
    manager.reset();
    stored
}

/// Forget the token and disconnect.
pub fn logout(manager: &RealtimeManager) {
    manager.storage().remove_item(&manager.config().token_key);
    manager.reset();
}

pub fn current_token(manager: &RealtimeManager) -> Option<String> {
    manager
        .storage()
        .get_item(&manager.config().token_key)
        .filter(|token| !token.trim().is_empty())
}

/// Authentication context provided to the app
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub token: Signal<Option<String>>,
    manager: &'static RealtimeManager,
}

/// Provider component that sets up auth context from the stored token.
#[component]
pub fn AuthProvider(children: Element) -> Element {
    let manager = realtime::global();
    let token = use_signal(|| current_token(manager));
    use_context_provider(|| AuthContext { token, manager });

    children
}

impl AuthContext {
    pub fn login(&mut self, token: String) {
        if login(self.manager, &token) {
            self.token.set(Some(token));
        }
    }

    pub fn logout(&mut self) {
        logout(self.manager);
        self.token.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// API client carrying the current bearer token.
    pub fn client(&self) -> ApiClient {
        match self.token.read().as_deref() {
            Some(token) => ApiClient::new().with_bearer_token(token),
            None => ApiClient::new(),
        }
    }
}

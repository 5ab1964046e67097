//! Lexdesk Client - Dioxus front-end core
//!
//! This crate contains the reusable pieces of the lexdesk case-management
//! front end: the headless/Dioxus `DataTable` and the token-gated realtime
//! notification channel.

pub mod api_client;
pub mod auth_session;
pub mod config;
pub mod logging;
pub mod realtime;
pub mod storage;
pub mod table;

pub mod components;

pub use api_client::{ApiClient, ApiRequest};
pub use auth_session::{AuthContext, AuthProvider};
pub use config::BroadcastConfig;
pub use realtime::{RealtimeManager, Subscription};
pub use storage::{MemoryStorage, PersistentStorage, TokenStore};
pub use table::{DataTable, Pagination, TableColumn};

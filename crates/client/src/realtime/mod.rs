//! Realtime notifications over a Pusher-protocol broadcaster.
//!
//! ```text
//!  RealtimeManager ──get_connection()──▶ Connection (one per token)
//!                                          │
//!            subscribe_user() ─join──▶ ChannelRegistry ◀─dispatch─┐
//!                                          │                      │
//!                                          ▼                      │
//!                                   BroadcastTransport ─▶ PusherSession
//!                                   (socket task)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! // Component scope: subscribe on mount, leave on unmount.
//! let notifications = use_user_notifications("42");
//!
//! // Anywhere else: keep the guard for as long as you want messages.
//! let subscription = realtime::subscribe("42", |notification| {
//!     log_info!("{}", notification.to_value());
//! });
//!
//! // After login/logout:
//! realtime::reset();
//! ```

mod channels;
mod connection;
mod error;
mod hooks;
mod manager;
mod session;
mod subscription;
pub mod transport;

pub use channels::{ChannelHandlers, ChannelRegistry, Joined, ListenerId};
pub use connection::Connection;
pub use error::{ChannelError, RealtimeError};
pub use hooks::{use_user_notifications, use_user_notifications_on};
pub use manager::{get_connection, global, install, reset, RealtimeManager};
pub use session::{PusherSession, SessionAction};
pub use subscription::{subscribe, subscribe_user, user_channel, Subscription, UserBinding};
pub use transport::{
    BroadcastTransport, ConnectOptions, PusherTransportFactory, ReconnectConfig, TransportFactory,
};

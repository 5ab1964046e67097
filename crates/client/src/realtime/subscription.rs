//! Per-user notification subscriptions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use lexdesk_shared::{Notification, NotificationPayload, MESSAGE_SENT};

use super::channels::{ChannelHandlers, ListenerId};
use super::connection::Connection;
use super::manager::{global, RealtimeManager};

/// Channel name (before the `private-` prefix) for a user's notifications.
pub fn user_channel(user_id: &str) -> String {
    format!("user.{}", user_id)
}

/// Join `user.<user_id>` and deliver every `MessageSent` payload, normalized
/// and stamped with its receipt time, to `on_message`.
///
/// Returns `None`, after logging, when no token is stored. Dropping the
/// returned guard leaves the channel.
pub fn subscribe_user(
    manager: &RealtimeManager,
    user_id: &str,
    on_message: impl Fn(Notification) + Send + Sync + 'static,
) -> Option<Subscription> {
    let Some(connection) = manager.get_connection() else {
        crate::log_warn!("Not subscribing to notifications for user {}: no connection", user_id);
        return None;
    };

    let channel_name = user_channel(user_id);
    let for_success = channel_name.clone();
    let for_error = channel_name.clone();

    let handlers = ChannelHandlers::new()
        .on_subscribed(move || {
            crate::log_info!("Subscribed to {}", for_success);
        })
        .on_error(move |error| {
            crate::log_error!("Subscription error on {}: {}", for_error, error);
        })
        .listen(MESSAGE_SENT, move |data| {
            let notification = Notification::receive(data);
            if let NotificationPayload::ParseFailed(raw) = &notification.payload {
                crate::log_warn!("Notification payload is not valid JSON: {}", raw);
            }
            on_message(notification);
        });

    let (channel, listener) = connection.join_private(&channel_name, handlers);
    Some(Subscription::new(&connection, channel, listener))
}

/// [`subscribe_user`] on the process-wide manager.
pub fn subscribe(
    user_id: &str,
    on_message: impl Fn(Notification) + Send + Sync + 'static,
) -> Option<Subscription> {
    subscribe_user(global(), user_id, on_message)
}

/// Scoped channel membership. Leaves exactly once, on [`unsubscribe`] or
/// drop, whichever comes first.
///
/// [`unsubscribe`]: Subscription::unsubscribe
#[must_use = "dropping a Subscription leaves the channel immediately"]
pub struct Subscription {
    connection: Weak<Connection>,
    channel: String,
    listener: ListenerId,
    left: AtomicBool,
}

impl Subscription {
    fn new(connection: &Arc<Connection>, channel: String, listener: ListenerId) -> Self {
        Self {
            connection: Arc::downgrade(connection),
            channel,
            listener,
            left: AtomicBool::new(false),
        }
    }

    /// Full channel name, e.g. `private-user.42`.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    /// `false` once left, or once the connection was reset or dropped.
    pub fn is_active(&self) -> bool {
        !self.left.load(Ordering::Acquire)
            && self
                .connection
                .upgrade()
                .is_some_and(|connection| !connection.is_disconnected())
    }

    pub fn unsubscribe(self) {
        self.leave();
    }

    fn leave(&self) {
        if self.left.swap(true, Ordering::AcqRel) {
            return;
        }
        // A reset connection is already gone along with its listeners.
        if let Some(connection) = self.connection.upgrade() {
            connection.leave(&self.channel, self.listener);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.leave();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("listener", &self.listener)
            .finish()
    }
}

/// A user subscription that follows the current user id and the manager's
/// current connection. [`bind`](UserBinding::bind) is cheap when nothing
/// changed and re-subscribes when the user changed or the old guard went
/// stale (for example after [`RealtimeManager::reset`]).
#[derive(Debug, Default)]
pub struct UserBinding {
    user_id: Option<String>,
    subscription: Option<Subscription>,
}

impl UserBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// User of the last [`bind`](Self::bind), subscribed or not.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    /// Live subscription for `user_id` already held.
    pub fn is_current(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
            && self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// Make sure this binding listens on `user_id`'s channel. Returns `true`
    /// when a new subscription was made.
    pub fn bind(
        &mut self,
        manager: &RealtimeManager,
        user_id: &str,
        on_message: impl Fn(Notification) + Send + Sync + 'static,
    ) -> bool {
        if self.is_current(user_id) {
            return false;
        }
        self.release();
        self.subscription = subscribe_user(manager, user_id, on_message);
        self.user_id = Some(user_id.to_string());
        self.subscription.is_some()
    }

    /// Leave the channel, if any.
    pub fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

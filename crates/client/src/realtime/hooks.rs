//! Dioxus hooks over the realtime manager.

use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use futures_channel::mpsc::unbounded;
use futures_util::StreamExt;
use lexdesk_shared::Notification;

use super::manager::{global, RealtimeManager};
use super::subscription::UserBinding;
use crate::auth_session::AuthContext;

enum Feed {
    /// A different user was bound; earlier notifications belong to them.
    UserChanged,
    Received(Notification),
}

/// Notifications received for `user_id` while the calling component is
/// mounted, oldest first.
///
/// Subscribes on mount through the process-wide manager and leaves the
/// channel on unmount. Stays empty while no token is stored.
pub fn use_user_notifications(user_id: &str) -> Signal<Vec<Notification>> {
    use_user_notifications_on(global(), user_id)
}

/// [`use_user_notifications`] against an explicit manager.
///
/// The binding is checked on every render: a new `user_id` or a connection
/// dropped by `reset()` leads to a fresh subscription. Inside an
/// [`AuthProvider`](crate::auth_session::AuthProvider) the component also
/// re-renders on sign-in changes.
pub fn use_user_notifications_on(
    manager: &'static RealtimeManager,
    user_id: &str,
) -> Signal<Vec<Notification>> {
    let mut notifications = use_signal(Vec::<Notification>::new);

    if let Some(auth) = try_use_context::<AuthContext>() {
        let _ = auth.token.read();
    }

    let (feed, binding) = use_hook(|| {
        let (tx, mut rx) = unbounded::<Feed>();

        // Listener callbacks run on the transport task; hop onto the
        // component's scope before touching the signal.
        spawn(async move {
            while let Some(item) = rx.next().await {
                match item {
                    Feed::UserChanged => notifications.write().clear(),
                    Feed::Received(notification) => notifications.write().push(notification),
                }
            }
        });

        (tx, Rc::new(RefCell::new(UserBinding::new())))
    });

    {
        let mut binding = binding.borrow_mut();
        if !binding.is_current(user_id) {
            if binding.user_id().is_some_and(|previous| previous != user_id) {
                let _ = feed.unbounded_send(Feed::UserChanged);
            }
            let tx = feed.clone();
            binding.bind(manager, user_id, move |notification| {
                let _ = tx.unbounded_send(Feed::Received(notification));
            });
        }
    }

    use_drop(move || binding.borrow_mut().release());

    notifications
}

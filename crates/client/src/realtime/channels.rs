//! Listener bookkeeping for the channels of one connection.
//!
//! Several consumers may join the same channel. Each join returns a
//! [`ListenerId`]; the transport subscribes on the first listener and
//! unsubscribes when the last one leaves. Callbacks are invoked with the
//! registry lock released, so a callback may join or leave channels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lexdesk_shared::format_event_name;
use serde_json::Value;

use super::error::ChannelError;

pub type ListenerId = u64;

type StatusCallback = Arc<dyn Fn() + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&ChannelError) + Send + Sync>;
type EventCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Callbacks one consumer attaches to a channel.
#[derive(Clone, Default)]
pub struct ChannelHandlers {
    on_subscribed: Option<StatusCallback>,
    on_error: Option<ErrorCallback>,
    events: Vec<(String, EventCallback)>,
}

impl ChannelHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once the broker confirms the subscription.
    pub fn on_subscribed(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_subscribed = Some(Arc::new(callback));
        self
    }

    /// Called when authorization or the subscription itself fails.
    pub fn on_error(mut self, callback: impl Fn(&ChannelError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Listen for `event` (namespaced on join) with its raw `data`.
    pub fn listen(mut self, event: &str, callback: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.events.push((event.to_string(), Arc::new(callback)));
        self
    }

    fn namespaced(mut self, namespace: Option<&str>) -> Self {
        for (event, _) in self.events.iter_mut() {
            *event = format_event_name(event, namespace);
        }
        self
    }
}

/// Outcome of [`ChannelRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joined {
    pub id: ListenerId,
    /// No listener existed before; the transport must subscribe.
    pub first: bool,
}

struct Listener {
    id: ListenerId,
    handlers: ChannelHandlers,
}

#[derive(Default)]
struct ChannelEntry {
    subscribed: bool,
    listeners: Vec<Listener>,
}

pub struct ChannelRegistry {
    namespace: Option<String>,
    next_id: AtomicU64,
    channels: Mutex<HashMap<String, ChannelEntry>>,
}

impl ChannelRegistry {
    pub fn new(namespace: Option<String>) -> Self {
        Self {
            namespace,
            next_id: AtomicU64::new(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ChannelEntry>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handlers` on `channel`. A listener joining an already
    /// confirmed channel has its subscribed callback invoked immediately.
    pub fn add(&self, channel: &str, handlers: ChannelHandlers) -> Joined {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handlers = handlers.namespaced(self.namespace.as_deref());
        let on_subscribed = handlers.on_subscribed.clone();

        let (first, already_subscribed) = {
            let mut channels = self.lock();
            let entry = channels.entry(channel.to_string()).or_default();
            let first = entry.listeners.is_empty();
            entry.listeners.push(Listener { id, handlers });
            (first, entry.subscribed)
        };

        if already_subscribed {
            if let Some(callback) = on_subscribed {
                callback();
            }
        }

        Joined { id, first }
    }

    /// Remove one listener. Returns `true` when it was the channel's last,
    /// in which case the channel is forgotten.
    pub fn remove(&self, channel: &str, id: ListenerId) -> bool {
        let mut channels = self.lock();
        let Some(entry) = channels.get_mut(channel) else {
            return false;
        };

        let before = entry.listeners.len();
        entry.listeners.retain(|l| l.id != id);
        if entry.listeners.len() == before {
            return false;
        }

        if entry.listeners.is_empty() {
            channels.remove(channel);
            true
        } else {
            false
        }
    }

    /// Drop every listener of `channel`. Returns whether any existed.
    pub fn remove_channel(&self, channel: &str) -> bool {
        self.lock().remove(channel).is_some()
    }

    pub fn subscription_succeeded(&self, channel: &str) {
        let callbacks: Vec<StatusCallback> = {
            let mut channels = self.lock();
            let Some(entry) = channels.get_mut(channel) else {
                return;
            };
            entry.subscribed = true;
            entry
                .listeners
                .iter()
                .filter_map(|l| l.handlers.on_subscribed.clone())
                .collect()
        };

        for callback in callbacks {
            callback();
        }
    }

    pub fn subscription_failed(&self, channel: &str, error: &ChannelError) {
        let callbacks: Vec<ErrorCallback> = {
            let mut channels = self.lock();
            let Some(entry) = channels.get_mut(channel) else {
                return;
            };
            entry.subscribed = false;
            entry
                .listeners
                .iter()
                .filter_map(|l| l.handlers.on_error.clone())
                .collect()
        };

        for callback in callbacks {
            callback(error);
        }
    }

    /// Deliver `data` to every listener of `event` on `channel`, in
    /// registration order. Returns the number of callbacks invoked.
    pub fn dispatch(&self, channel: &str, event: &str, data: Value) -> usize {
        let callbacks: Vec<EventCallback> = {
            let channels = self.lock();
            let Some(entry) = channels.get(channel) else {
                return 0;
            };
            entry
                .listeners
                .iter()
                .flat_map(|l| l.handlers.events.iter())
                .filter(|(name, _)| name == event)
                .map(|(_, callback)| callback.clone())
                .collect()
        };

        for callback in &callbacks {
            callback(data.clone());
        }
        callbacks.len()
    }

    /// The socket went away; every channel awaits re-confirmation.
    pub fn connection_lost(&self) {
        for entry in self.lock().values_mut() {
            entry.subscribed = false;
        }
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.lock()
            .get(channel)
            .map(|entry| entry.listeners.len())
            .unwrap_or(0)
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.lock()
            .get(channel)
            .map(|entry| entry.subscribed)
            .unwrap_or(false)
    }

    /// Names of channels with at least one listener, sorted.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

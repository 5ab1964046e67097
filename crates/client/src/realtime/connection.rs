//! A live broadcaster connection bound to one bearer token.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use lexdesk_shared::private_channel_name;

use super::channels::{ChannelHandlers, ChannelRegistry, ListenerId};
use super::transport::{BroadcastTransport, ConnectOptions};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// The singleton handle returned by
/// [`RealtimeManager::get_connection`](super::RealtimeManager::get_connection).
pub struct Connection {
    id: u64,
    options: ConnectOptions,
    registry: Arc<ChannelRegistry>,
    transport: Box<dyn BroadcastTransport>,
    disconnected: AtomicBool,
}

impl Connection {
    pub(crate) fn new(
        options: ConnectOptions,
        registry: Arc<ChannelRegistry>,
        transport: Box<dyn BroadcastTransport>,
    ) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            options,
            registry,
            transport,
            disconnected: AtomicBool::new(false),
        }
    }

    /// Process-unique id, distinct for every handle the manager builds.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Acquire)
    }

    /// Join the private channel `name` (`"user.42"` joins `"private-user.42"`).
    /// Returns the full channel name and the listener id to leave with.
    pub fn join_private(&self, name: &str, handlers: ChannelHandlers) -> (String, ListenerId) {
        let channel = private_channel_name(name);
        let joined = self.registry.add(&channel, handlers);
        if joined.first {
            self.transport.subscribe(&channel);
        }
        (channel, joined.id)
    }

    /// Remove one listener. The transport leaves the channel with its last
    /// listener; other consumers of the channel are unaffected.
    pub fn leave(&self, channel: &str, listener: ListenerId) {
        if self.registry.remove(channel, listener) {
            self.transport.unsubscribe(channel);
        }
    }

    /// Leave `channel` for every consumer.
    pub fn leave_channel(&self, channel: &str) {
        if self.registry.remove_channel(channel) {
            self.transport.unsubscribe(channel);
        }
    }

    /// Best-effort shutdown of the transport. Only the first call is sent.
    pub fn disconnect(&self) {
        if !self.disconnected.swap(true, Ordering::AcqRel) {
            self.transport.disconnect();
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("socket_url", &self.options.socket_url)
            .field("channels", &self.registry.channels())
            .field("disconnected", &self.is_disconnected())
            .finish()
    }
}

//! Socket transport for the broadcaster.
//!
//! [`TransportFactory`] is the seam between the connection manager and the
//! network: the manager asks it for a [`BroadcastTransport`] and from then on
//! only issues subscribe/unsubscribe/disconnect commands. Inbound traffic is
//! delivered by the transport straight into the shared [`ChannelRegistry`].
//!
//! The Pusher implementation runs one background task per connection. The
//! task owns a [`PusherSession`] and is platform specific only in how it
//! opens sockets and sleeps (see `native.rs` and `wasm.rs`).

use std::collections::VecDeque;
use std::sync::Arc;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{Stream, StreamExt};
use lexdesk_shared::{ApiError, ChannelAuthorization};

use super::channels::ChannelRegistry;
use super::error::RealtimeError;
use super::session::{PusherSession, SessionAction};
use crate::api_client::ApiClient;
use crate::config::{BroadcastConfig, TransportKind};

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod wasm;

/// Commands a connection accepts once created.
pub trait BroadcastTransport: Send + Sync {
    /// Join `channel` (already carrying its `private-` prefix).
    fn subscribe(&self, channel: &str);
    fn unsubscribe(&self, channel: &str);
    /// Close the socket and stop reconnecting. Idempotent.
    fn disconnect(&self);
}

/// Creates transports. Swapped for a fake in tests.
pub trait TransportFactory: Send + Sync {
    fn connect(
        &self,
        options: ConnectOptions,
        registry: Arc<ChannelRegistry>,
    ) -> Result<Box<dyn BroadcastTransport>, RealtimeError>;
}

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Maximum number of reconnect attempts (0 = infinite)
    pub max_attempts: u32,
    /// Initial delay in milliseconds
    pub initial_delay_ms: u32,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u32,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 1.5,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number
    pub fn delay_for_attempt(&self, attempt: u32) -> u32 {
        let delay = self.initial_delay_ms as f32 * self.backoff_multiplier.powi(attempt as i32);
        (delay as u32).min(self.max_delay_ms)
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts > 0 && attempt >= self.max_attempts
    }

    /// Delay before retry number `attempt + 1`, advancing `attempt`.
    /// `None` once the attempts are used up.
    pub fn next_delay(&self, attempt: &mut u32) -> Option<u32> {
        if self.exhausted(*attempt) {
            return None;
        }
        let delay = self.delay_for_attempt(*attempt);
        *attempt += 1;
        Some(delay)
    }
}

/// Everything a transport needs to open and authorize a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    pub socket_url: String,
    pub auth_endpoint: String,
    /// Sent with every channel authorization request.
    pub auth_headers: Vec<(String, String)>,
    pub transport: TransportKind,
    pub disable_stats: bool,
    pub reconnect: ReconnectConfig,
}

impl ConnectOptions {
    pub fn new(config: &BroadcastConfig, token: &str) -> Self {
        Self {
            socket_url: config.socket_url(),
            auth_endpoint: config.auth_endpoint.clone(),
            auth_headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", token)),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            transport: config.transport(),
            disable_stats: config.disable_stats,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.auth_headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    Subscribe(String),
    Unsubscribe(String),
    Disconnect,
}

/// Handle to a Pusher connection task.
pub struct PusherTransport {
    commands: UnboundedSender<TransportCommand>,
}

impl PusherTransport {
    fn send(&self, command: TransportCommand) {
        if self.commands.unbounded_send(command).is_err() {
            crate::log_debug!("Broadcaster task already stopped");
        }
    }
}

impl BroadcastTransport for PusherTransport {
    fn subscribe(&self, channel: &str) {
        self.send(TransportCommand::Subscribe(channel.to_string()));
    }

    fn unsubscribe(&self, channel: &str) {
        self.send(TransportCommand::Unsubscribe(channel.to_string()));
    }

    fn disconnect(&self) {
        self.send(TransportCommand::Disconnect);
        self.commands.close_channel();
    }
}

/// Connects to a Pusher-protocol broker (Reverb or Pusher).
#[derive(Debug, Default, Clone, Copy)]
pub struct PusherTransportFactory;

impl TransportFactory for PusherTransportFactory {
    fn connect(
        &self,
        options: ConnectOptions,
        registry: Arc<ChannelRegistry>,
    ) -> Result<Box<dyn BroadcastTransport>, RealtimeError> {
        let (commands, receiver) = unbounded();
        let driver = SessionDriver::new(&options, registry);

        #[cfg(not(target_arch = "wasm32"))]
        native::spawn(options, driver, receiver)?;
        #[cfg(target_arch = "wasm32")]
        wasm::spawn(options, driver, receiver);

        Ok(Box::new(PusherTransport { commands }))
    }
}

/// Signs private channel subscriptions against the auth endpoint.
#[derive(Debug, Clone)]
pub struct Authorizer {
    client: ApiClient,
    endpoint: String,
}

impl Authorizer {
    pub fn new(options: &ConnectOptions) -> Self {
        let client = options
            .auth_headers
            .iter()
            .fold(ApiClient::new(), |client, (name, value)| {
                client.with_header(name.as_str(), value.as_str())
            });
        Self {
            client,
            endpoint: options.auth_endpoint.clone(),
        }
    }

    pub async fn authorize(
        &self,
        channel: &str,
        socket_id: &str,
    ) -> Result<ChannelAuthorization, ApiError> {
        self.client
            .post_form(
                &self.endpoint,
                &[("socket_id", socket_id), ("channel_name", channel)],
            )
            .await
    }
}

/// Input to the per-socket loop.
pub(crate) enum LoopInput {
    Frame(String),
    Command(TransportCommand),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopExit {
    /// The socket closed; reconnect.
    Closed,
    /// Disconnect was requested or the transport handle dropped.
    Shutdown,
    /// The broker refused this client for good (`pusher:error` 4000-4099).
    Rejected,
}

/// Protocol state plus the side effects of [`SessionAction`]s.
pub(crate) struct SessionDriver {
    session: PusherSession,
    registry: Arc<ChannelRegistry>,
    authorizer: Authorizer,
    /// Set once the broker sends `connection_established`.
    established: bool,
    rejected: bool,
}

impl SessionDriver {
    fn new(options: &ConnectOptions, registry: Arc<ChannelRegistry>) -> Self {
        Self {
            session: PusherSession::new(),
            registry,
            authorizer: Authorizer::new(options),
            established: false,
            rejected: false,
        }
    }

    /// Whether a session was established since the last call. The backoff
    /// counter only resets on this, not on a bare socket open.
    pub(crate) fn take_established(&mut self) -> bool {
        std::mem::take(&mut self.established)
    }

    /// Run one socket until it closes or shutdown is requested. Frames to
    /// write go to `outgoing`.
    pub(crate) async fn run<S>(&mut self, inputs: &mut S, outgoing: &UnboundedSender<String>) -> LoopExit
    where
        S: Stream<Item = LoopInput> + Unpin,
    {
        while let Some(input) = inputs.next().await {
            let actions = match input {
                LoopInput::Frame(text) => self.session.handle_text(&text),
                LoopInput::Command(TransportCommand::Subscribe(channel)) => {
                    self.session.subscribe(&channel)
                }
                LoopInput::Command(TransportCommand::Unsubscribe(channel)) => {
                    self.session.unsubscribe(&channel)
                }
                LoopInput::Command(TransportCommand::Disconnect) => return LoopExit::Shutdown,
                LoopInput::Closed => break,
            };
            self.perform(actions, outgoing).await;

            if self.session.is_connected() {
                self.established = true;
            }
            if self.rejected {
                self.connection_lost();
                return LoopExit::Rejected;
            }
        }

        self.connection_lost();
        LoopExit::Closed
    }

    async fn perform(&mut self, actions: Vec<SessionAction>, outgoing: &UnboundedSender<String>) {
        let mut queue = VecDeque::from(actions);
        while let Some(action) = queue.pop_front() {
            match action {
                SessionAction::Send(frame) => {
                    if outgoing.unbounded_send(frame.to_text()).is_err() {
                        crate::log_debug!("Socket writer gone, dropping {}", frame.event);
                    }
                }
                SessionAction::Authorize { channel, socket_id } => {
                    let follow_up = match self.authorizer.authorize(&channel, &socket_id).await {
                        Ok(authorization) => {
                            self.session
                                .authorized(&channel, &socket_id, &authorization.auth)
                        }
                        Err(e) => {
                            crate::log_error!("Authorization for {} failed: {}", channel, e);
                            self.session.authorization_failed(&channel, e.summary())
                        }
                    };
                    queue.extend(follow_up);
                }
                SessionAction::Subscribed(channel) => {
                    crate::log_debug!("Subscribed to {}", channel);
                    self.registry.subscription_succeeded(&channel);
                }
                SessionAction::SubscriptionFailed { channel, error } => {
                    self.registry.subscription_failed(&channel, &error);
                }
                SessionAction::Event { channel, event, data } => {
                    let delivered = self.registry.dispatch(&channel, &event, data);
                    if delivered == 0 {
                        crate::log_debug!("No listener for {} on {}", event, channel);
                    }
                }
                SessionAction::BrokerError(error) => {
                    crate::log_error!("Broadcaster error: {}", error);
                    if error.forbids_reconnect() {
                        self.rejected = true;
                    }
                }
            }
        }
    }

    fn connection_lost(&mut self) {
        self.session.connection_lost();
        self.registry.connection_lost();
    }

    /// Apply commands queued while no socket is open. Returns `false` when
    /// the task should stop.
    pub(crate) fn drain_pending(&mut self, commands: &mut UnboundedReceiver<TransportCommand>) -> bool {
        loop {
            match commands.try_next() {
                Ok(Some(TransportCommand::Subscribe(channel))) => {
                    self.session.subscribe(&channel);
                }
                Ok(Some(TransportCommand::Unsubscribe(channel))) => {
                    self.session.unsubscribe(&channel);
                }
                Ok(Some(TransportCommand::Disconnect)) | Ok(None) => return false,
                Err(_) => return true,
            }
        }
    }
}

/// Merge socket frames with commands. The frame stream ending yields
/// [`LoopInput::Closed`]; the command stream ending yields a disconnect.
pub(crate) fn loop_inputs<'a>(
    frames: UnboundedReceiver<String>,
    commands: &'a mut UnboundedReceiver<TransportCommand>,
) -> impl Stream<Item = LoopInput> + Unpin + 'a {
    let frames = frames
        .map(LoopInput::Frame)
        .chain(futures_util::stream::once(futures_util::future::ready(LoopInput::Closed)));
    let commands = commands
        .map(LoopInput::Command)
        .chain(futures_util::stream::once(futures_util::future::ready(
            LoopInput::Command(TransportCommand::Disconnect),
        )));
    futures_util::stream::select(frames, commands)
}

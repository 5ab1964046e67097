//! Sans-IO Pusher protocol session.
//!
//! [`PusherSession`] tracks the socket id and the channels the client wants
//! to be in. It consumes inbound frames and subscription commands and
//! returns [`SessionAction`]s; the platform transport performs the I/O.
//! The wanted-channel set survives reconnects: every
//! `pusher:connection_established` re-authorizes all of them.

use std::collections::BTreeSet;

use lexdesk_shared::{
    BrokerError, ConnectionEstablished, PusherFrame, EVENT_CONNECTION_ESTABLISHED, EVENT_ERROR,
    EVENT_PING, EVENT_SUBSCRIPTION_ERROR, EVENT_SUBSCRIPTION_SUCCEEDED,
};
use serde_json::Value;

use super::error::ChannelError;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Write a frame to the socket.
    Send(PusherFrame),
    /// Ask the auth endpoint to sign `channel` for `socket_id`.
    Authorize { channel: String, socket_id: String },
    /// The broker confirmed a subscription.
    Subscribed(String),
    SubscriptionFailed { channel: String, error: ChannelError },
    /// An application event on a wanted channel.
    Event {
        channel: String,
        event: String,
        data: Value,
    },
    /// A connection-level `pusher:error`.
    BrokerError(BrokerError),
}

#[derive(Debug, Default)]
pub struct PusherSession {
    socket_id: Option<String>,
    channels: BTreeSet<String>,
}

impl PusherSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn socket_id(&self) -> Option<&str> {
        self.socket_id.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.socket_id.is_some()
    }

    pub fn wants(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(String::as_str)
    }

    /// Start wanting `channel`. Authorization starts right away when connected.
    pub fn subscribe(&mut self, channel: &str) -> Vec<SessionAction> {
        if !self.channels.insert(channel.to_string()) {
            return Vec::new();
        }
        match &self.socket_id {
            Some(socket_id) => vec![SessionAction::Authorize {
                channel: channel.to_string(),
                socket_id: socket_id.clone(),
            }],
            None => Vec::new(),
        }
    }

    pub fn unsubscribe(&mut self, channel: &str) -> Vec<SessionAction> {
        if !self.channels.remove(channel) || !self.is_connected() {
            return Vec::new();
        }
        vec![SessionAction::Send(PusherFrame::unsubscribe(channel))]
    }

    /// Authorization for `channel` arrived. Ignored when the channel is no
    /// longer wanted or the signature was made for a previous socket.
    pub fn authorized(&mut self, channel: &str, socket_id: &str, auth: &str) -> Vec<SessionAction> {
        if !self.wants(channel) || self.socket_id.as_deref() != Some(socket_id) {
            return Vec::new();
        }
        vec![SessionAction::Send(PusherFrame::subscribe(channel, auth))]
    }

    pub fn authorization_failed(&mut self, channel: &str, reason: String) -> Vec<SessionAction> {
        if !self.wants(channel) {
            return Vec::new();
        }
        vec![SessionAction::SubscriptionFailed {
            channel: channel.to_string(),
            error: ChannelError::Authorization(reason),
        }]
    }

    /// The socket closed. Channels stay wanted for the next connection.
    pub fn connection_lost(&mut self) {
        self.socket_id = None;
    }

    /// Handle a raw text message. Undecodable text is logged and dropped.
    pub fn handle_text(&mut self, text: &str) -> Vec<SessionAction> {
        match PusherFrame::parse(text) {
            Ok(frame) => self.handle_frame(frame),
            Err(e) => {
                crate::log_warn!("Dropping broadcaster frame: {}", e);
                Vec::new()
            }
        }
    }

    pub fn handle_frame(&mut self, frame: PusherFrame) -> Vec<SessionAction> {
        let event = frame.event.clone();
        match event.as_str() {
            EVENT_CONNECTION_ESTABLISHED => {
                match frame.decode_data::<ConnectionEstablished>() {
                    Ok(established) => {
                        crate::log_info!("Broadcaster socket id {}", established.socket_id);
                        self.socket_id = Some(established.socket_id.clone());
                        self.channels
                            .iter()
                            .map(|channel| SessionAction::Authorize {
                                channel: channel.clone(),
                                socket_id: established.socket_id.clone(),
                            })
                            .collect()
                    }
                    Err(e) => {
                        crate::log_error!("{}", e);
                        Vec::new()
                    }
                }
            }
            EVENT_PING => vec![SessionAction::Send(PusherFrame::pong())],
            EVENT_SUBSCRIPTION_SUCCEEDED => match frame.channel {
                Some(channel) if self.wants(&channel) => vec![SessionAction::Subscribed(channel)],
                _ => Vec::new(),
            },
            EVENT_SUBSCRIPTION_ERROR => {
                let error = frame.decode_data::<BrokerError>().unwrap_or_default();
                match frame.channel {
                    Some(channel) if self.wants(&channel) => vec![SessionAction::SubscriptionFailed {
                        channel,
                        error: error.into(),
                    }],
                    _ => Vec::new(),
                }
            }
            EVENT_ERROR => {
                vec![SessionAction::BrokerError(
                    frame.decode_data::<BrokerError>().unwrap_or_default(),
                )]
            }
            _ if frame.is_internal() => Vec::new(),
            _ => match frame.channel {
                Some(channel) if self.wants(&channel) => vec![SessionAction::Event {
                    channel,
                    event: frame.event,
                    data: frame.data.unwrap_or(Value::Null),
                }],
                _ => Vec::new(),
            },
        }
    }
}

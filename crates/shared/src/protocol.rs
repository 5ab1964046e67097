//! Broadcaster wire protocol (Pusher protocol version 7).
//!
//! Reverb and Pusher speak the same JSON framing over a WebSocket:
//!
//! ```text
//! {"event": "pusher:subscribe", "data": {"auth": "key:signature", "channel": "private-user.42"}}
//! {"event": "App\\Events\\MessageSent", "channel": "private-user.42", "data": "{\"text\":\"hi\"}"}
//! ```
//!
//! `data` is a JSON-encoded string for almost every server-originated frame,
//! but some brokers send structured objects. [`PusherFrame::decode_data`]
//! accepts both.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ProtocolError;

/// Protocol revision announced in the socket URL.
pub const PROTOCOL_VERSION: u8 = 7;

pub const EVENT_CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
pub const EVENT_ERROR: &str = "pusher:error";
pub const EVENT_PING: &str = "pusher:ping";
pub const EVENT_PONG: &str = "pusher:pong";
pub const EVENT_SUBSCRIBE: &str = "pusher:subscribe";
pub const EVENT_UNSUBSCRIBE: &str = "pusher:unsubscribe";
pub const EVENT_SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";
pub const EVENT_SUBSCRIPTION_ERROR: &str = "pusher:subscription_error";

/// Prefix the broker expects on authentication-gated channels.
pub const PRIVATE_PREFIX: &str = "private-";

/// Default namespace prepended to application event names.
pub const DEFAULT_EVENT_NAMESPACE: &str = "App.Events";

/// A single frame on the socket, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PusherFrame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl PusherFrame {
    /// Parse a text message received from the socket.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }

    /// Serialize for sending.
    pub fn to_text(&self) -> String {
        // A frame only holds strings and `Value`s, which always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// `pusher:subscribe` for a private channel.
    pub fn subscribe(channel: &str, auth: &str) -> Self {
        Self {
            event: EVENT_SUBSCRIBE.to_string(),
            channel: None,
            data: Some(json!({ "auth": auth, "channel": channel })),
        }
    }

    /// `pusher:unsubscribe`.
    pub fn unsubscribe(channel: &str) -> Self {
        Self {
            event: EVENT_UNSUBSCRIBE.to_string(),
            channel: None,
            data: Some(json!({ "channel": channel })),
        }
    }

    /// `pusher:pong`, the answer to a server ping.
    pub fn pong() -> Self {
        Self {
            event: EVENT_PONG.to_string(),
            channel: None,
            data: Some(json!({})),
        }
    }

    /// True for `pusher:` and `pusher_internal:` events.
    pub fn is_internal(&self) -> bool {
        self.event.starts_with("pusher:") || self.event.starts_with("pusher_internal:")
    }

    /// Decode `data`, unwrapping the string encoding when present.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let data = self.data.clone().unwrap_or(Value::Null);
        let decoded = match data {
            Value::String(raw) => serde_json::from_str(&raw),
            other => serde_json::from_value(other),
        };
        decoded.map_err(|e| ProtocolError::MalformedData {
            event: self.event.clone(),
            reason: e.to_string(),
        })
    }
}

/// Payload of `pusher:connection_established`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEstablished {
    pub socket_id: String,
    #[serde(default)]
    pub activity_timeout: Option<u64>,
}

/// Payload of `pusher:error` and `pusher:subscription_error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrokerError {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl BrokerError {
    /// Pusher codes 4000-4099 mean the broker will keep refusing this
    /// client (bad app key, over quota, SSL only); retrying cannot help.
    pub fn forbids_reconnect(&self) -> bool {
        matches!(self.code, Some(4000..=4099))
    }
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.status, &self.message) {
            (Some(code), _, Some(msg)) => write!(f, "{} ({})", msg, code),
            (_, Some(status), Some(msg)) => write!(f, "{} (HTTP {})", msg, status),
            (_, _, Some(msg)) => write!(f, "{}", msg),
            (Some(code), _, None) => write!(f, "broker error {}", code),
            (None, Some(status), None) => write!(f, "HTTP {}", status),
            (None, None, None) => write!(f, "unknown broker error"),
        }
    }
}

/// Response body of the private-channel authorization endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAuthorization {
    pub auth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<String>,
}

/// Wire name of the private channel `name` (`user.42` -> `private-user.42`).
pub fn private_channel_name(name: &str) -> String {
    if name.starts_with(PRIVATE_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", PRIVATE_PREFIX, name)
    }
}

/// Resolve a listener's event name to the name used on the wire.
///
/// `MessageSent` under `App.Events` becomes `App\Events\MessageSent`.
/// A leading `.` or `\` opts out of the namespace.
pub fn format_event_name(event: &str, namespace: Option<&str>) -> String {
    if let Some(verbatim) = event.strip_prefix(['.', '\\']) {
        return verbatim.to_string();
    }

    let qualified = match namespace {
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, event),
        _ => event.to_string(),
    };
    qualified.replace('.', "\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_encoded_connection_data() {
        let frame = PusherFrame::parse(
            r#"{"event":"pusher:connection_established","data":"{\"socket_id\":\"123.456\",\"activity_timeout\":30}"}"#,
        )
        .unwrap();

        let established: ConnectionEstablished = frame.decode_data().unwrap();
        assert_eq!(established.socket_id, "123.456");
        assert_eq!(established.activity_timeout, Some(30));
        assert!(frame.is_internal());
    }

    #[test]
    fn decodes_structured_data_too() {
        let frame = PusherFrame::parse(
            r#"{"event":"pusher:error","data":{"code":4001,"message":"App key not in this cluster"}}"#,
        )
        .unwrap();

        let err: BrokerError = frame.decode_data().unwrap();
        assert_eq!(err.code, Some(4001));
        assert_eq!(err.to_string(), "App key not in this cluster (4001)");
        assert!(err.forbids_reconnect());
    }

    #[test]
    fn malformed_frame_is_an_error() {
        assert!(matches!(
            PusherFrame::parse("not json"),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[test]
    fn subscribe_frame_shape() {
        let frame = PusherFrame::subscribe("private-user.42", "key:sig");
        let value: Value = serde_json::from_str(&frame.to_text()).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "pusher:subscribe",
                "data": { "auth": "key:sig", "channel": "private-user.42" }
            })
        );
    }

    #[test]
    fn event_names_get_namespaced() {
        assert_eq!(
            format_event_name("MessageSent", Some(DEFAULT_EVENT_NAMESPACE)),
            "App\\Events\\MessageSent"
        );
        assert_eq!(format_event_name(".MessageSent", Some("App.Events")), "MessageSent");
        assert_eq!(format_event_name("\\Custom\\Event", Some("App.Events")), "Custom\\Event");
        assert_eq!(format_event_name("MessageSent", None), "MessageSent");
    }

    #[test]
    fn private_prefix_is_not_doubled() {
        assert_eq!(private_channel_name("user.42"), "private-user.42");
        assert_eq!(private_channel_name("private-user.42"), "private-user.42");
    }
}

//! Notification payloads pushed on a user's private channel.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Name listeners register for; resolved against the event namespace on the wire.
pub const MESSAGE_SENT: &str = "MessageSent";

/// Key added to every delivered notification.
pub const RECEIVED_AT_KEY: &str = "receivedAt";

/// Outcome of normalizing an event's `data` field.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationPayload {
    /// Structured data, either sent as-is or decoded from a JSON string.
    Parsed(Value),
    /// A string that was not valid JSON. Delivered raw rather than dropped.
    ParseFailed(String),
}

impl NotificationPayload {
    /// Normalize a wire value: strings are parsed as JSON, anything else is kept.
    pub fn from_wire(data: Value) -> Self {
        match data {
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(parsed) => NotificationPayload::Parsed(parsed),
                Err(_) => NotificationPayload::ParseFailed(raw),
            },
            other => NotificationPayload::Parsed(other),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, NotificationPayload::Parsed(_))
    }
}

/// A normalized payload stamped with its local receipt time.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub payload: NotificationPayload,
    pub received_at: DateTime<Utc>,
}

impl Notification {
    /// Normalize `data` and stamp it with the current time.
    pub fn receive(data: Value) -> Self {
        Self::received_at(data, Utc::now())
    }

    pub fn received_at(data: Value, received_at: DateTime<Utc>) -> Self {
        Self {
            payload: NotificationPayload::from_wire(data),
            received_at,
        }
    }

    /// `receivedAt` formatted the way browsers format ISO timestamps.
    pub fn received_at_iso(&self) -> String {
        self.received_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// The payload object with `receivedAt` merged in.
    ///
    /// Objects are augmented in place. Any other value, including the raw
    /// string of a failed parse, is wrapped under `payload`.
    pub fn to_value(&self) -> Value {
        let mut object = match &self.payload {
            NotificationPayload::Parsed(Value::Object(map)) => map.clone(),
            NotificationPayload::Parsed(other) => wrap(other.clone()),
            NotificationPayload::ParseFailed(raw) => wrap(Value::String(raw.clone())),
        };
        object.insert(
            RECEIVED_AT_KEY.to_string(),
            Value::String(self.received_at_iso()),
        );
        Value::Object(object)
    }

    /// Field lookup on object payloads.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match &self.payload {
            NotificationPayload::Parsed(Value::Object(map)) => map.get(key),
            _ => None,
        }
    }

    pub fn notification_id(&self) -> Option<i64> {
        self.get("notificationId").and_then(Value::as_i64)
    }

    pub fn text(&self) -> Option<&str> {
        self.get("text").and_then(Value::as_str)
    }
}

fn wrap(value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("payload".to_string(), value);
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
    }

    #[test]
    fn string_payload_is_parsed_and_stamped() {
        let n = Notification::received_at(
            Value::String(r#"{"notificationId":1,"text":"hi"}"#.to_string()),
            fixed_time(),
        );

        assert!(n.payload.is_parsed());
        assert_eq!(n.notification_id(), Some(1));
        assert_eq!(n.text(), Some("hi"));
        assert_eq!(
            n.to_value(),
            json!({
                "notificationId": 1,
                "text": "hi",
                "receivedAt": "2026-10-19T09:30:00.000Z"
            })
        );
    }

    #[test]
    fn structured_payload_is_only_augmented() {
        let n = Notification::received_at(json!({ "notificationId": 2 }), fixed_time());
        assert_eq!(
            n.to_value(),
            json!({ "notificationId": 2, "receivedAt": "2026-10-19T09:30:00.000Z" })
        );
    }

    #[test]
    fn malformed_string_is_delivered_raw() {
        let n = Notification::received_at(Value::String("{oops".to_string()), fixed_time());

        assert_eq!(n.payload, NotificationPayload::ParseFailed("{oops".to_string()));
        assert_eq!(n.notification_id(), None);
        assert_eq!(
            n.to_value(),
            json!({ "payload": "{oops", "receivedAt": "2026-10-19T09:30:00.000Z" })
        );
    }

    #[test]
    fn string_encoding_a_scalar_is_wrapped() {
        let n = Notification::received_at(Value::String("42".to_string()), fixed_time());
        assert_eq!(n.payload, NotificationPayload::Parsed(json!(42)));
        assert_eq!(n.to_value()["payload"], json!(42));
    }
}

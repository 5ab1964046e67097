use std::sync::{Arc, Mutex};

use chrono::DateTime;
use lexdesk_client::auth_session::{login, logout};
use lexdesk_client::config::BroadcastConfig;
use lexdesk_client::realtime::{
    subscribe_user, user_channel, BroadcastTransport, ChannelError, ChannelRegistry,
    ConnectOptions, RealtimeError, RealtimeManager, TransportFactory, UserBinding,
};
use lexdesk_client::storage::MemoryStorage;
use lexdesk_shared::Notification;
use rstest::{fixture, rstest};
use serde_json::{json, Value};

const WIRE_EVENT: &str = "App\\Events\\MessageSent";

#[derive(Default)]
struct Calls {
    connects: Vec<ConnectOptions>,
    subscribed: Vec<String>,
    unsubscribed: Vec<String>,
    disconnects: usize,
}

type SharedCalls = Arc<Mutex<Calls>>;

struct FakeTransport {
    calls: SharedCalls,
}

impl BroadcastTransport for FakeTransport {
    fn subscribe(&self, channel: &str) {
        self.calls.lock().unwrap().subscribed.push(channel.to_string());
    }

    fn unsubscribe(&self, channel: &str) {
        self.calls.lock().unwrap().unsubscribed.push(channel.to_string());
    }

    fn disconnect(&self) {
        self.calls.lock().unwrap().disconnects += 1;
    }
}

struct FakeFactory {
    calls: SharedCalls,
}

impl TransportFactory for FakeFactory {
    fn connect(
        &self,
        options: ConnectOptions,
        _registry: Arc<ChannelRegistry>,
    ) -> Result<Box<dyn BroadcastTransport>, RealtimeError> {
        self.calls.lock().unwrap().connects.push(options);
        Ok(Box::new(FakeTransport {
            calls: self.calls.clone(),
        }))
    }
}

struct FailingFactory;

impl TransportFactory for FailingFactory {
    fn connect(
        &self,
        _options: ConnectOptions,
        _registry: Arc<ChannelRegistry>,
    ) -> Result<Box<dyn BroadcastTransport>, RealtimeError> {
        Err(RealtimeError::Transport("unreachable broker".to_string()))
    }
}

struct Harness {
    manager: RealtimeManager,
    calls: SharedCalls,
}

fn harness(token: Option<&str>) -> Harness {
    let config = BroadcastConfig::default();
    let storage = match token {
        Some(token) => MemoryStorage::with_item(&config.token_key, token),
        None => MemoryStorage::new(),
    };
    let calls = SharedCalls::default();
    let manager = RealtimeManager::new(
        config,
        Arc::new(storage),
        Arc::new(FakeFactory {
            calls: calls.clone(),
        }),
    );
    Harness { manager, calls }
}

#[fixture]
fn signed_in() -> Harness {
    harness(Some("token-abc"))
}

#[fixture]
fn signed_out() -> Harness {
    harness(None)
}

fn collector() -> (
    Arc<Mutex<Vec<Notification>>>,
    impl Fn(Notification) + Clone + Send + Sync + 'static,
) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    (received, move |n: Notification| sink.lock().unwrap().push(n))
}

#[rstest]
fn connection_is_a_singleton_until_reset(signed_in: Harness) {
    let first = signed_in.manager.get_connection().unwrap();
    let second = signed_in.manager.get_connection().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(signed_in.calls.lock().unwrap().connects.len(), 1);

    signed_in.manager.reset();
    assert!(!signed_in.manager.has_connection());
    assert!(first.is_disconnected());
    assert_eq!(signed_in.calls.lock().unwrap().disconnects, 1);

    let third = signed_in.manager.get_connection().unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_ne!(first.id(), third.id());
    assert_eq!(signed_in.calls.lock().unwrap().connects.len(), 2);
}

#[rstest]
fn reset_without_connection_is_harmless(signed_out: Harness) {
    signed_out.manager.reset();
    signed_out.manager.reset();
    assert_eq!(signed_out.calls.lock().unwrap().disconnects, 0);
}

#[rstest]
fn no_token_means_no_connection_until_login(signed_out: Harness) {
    assert!(signed_out.manager.get_connection().is_none());
    assert!(!signed_out.manager.has_connection());
    assert!(signed_out.calls.lock().unwrap().connects.is_empty());

    assert!(login(&signed_out.manager, "fresh-token"));
    let connection = signed_out.manager.get_connection().unwrap();
    assert_eq!(
        connection.options().header("Authorization"),
        Some("Bearer fresh-token")
    );
}

#[test]
fn blank_token_is_treated_as_missing() {
    let h = harness(Some("   "));
    assert!(h.manager.get_connection().is_none());
    assert!(h.calls.lock().unwrap().connects.is_empty());
}

#[rstest]
fn connect_options_follow_config(signed_in: Harness) {
    let connection = signed_in.manager.get_connection().unwrap();
    let options = connection.options();
    let config = BroadcastConfig::default();

    assert_eq!(options.socket_url, config.socket_url());
    assert_eq!(options.auth_endpoint, config.auth_endpoint);
    assert_eq!(options.header("Authorization"), Some("Bearer token-abc"));
    assert_eq!(options.header("Accept"), Some("application/json"));
    assert!(options.socket_url.starts_with("wss://"));
}

#[test]
fn factory_failure_is_not_cached() {
    let config = BroadcastConfig::default();
    let storage = MemoryStorage::with_item(&config.token_key, "token-abc");
    let manager = RealtimeManager::new(config, Arc::new(storage), Arc::new(FailingFactory));

    assert!(manager.get_connection().is_none());
    assert!(!manager.has_connection());
}

#[rstest]
fn logout_resets_and_blocks_reconnect(signed_in: Harness) {
    let connection = signed_in.manager.get_connection().unwrap();
    logout(&signed_in.manager);

    assert!(connection.is_disconnected());
    assert!(signed_in.manager.get_connection().is_none());
}

#[rstest]
fn login_rebinds_to_the_new_token(signed_in: Harness) {
    let old = signed_in.manager.get_connection().unwrap();
    login(&signed_in.manager, "rotated");

    let new = signed_in.manager.get_connection().unwrap();
    assert!(old.is_disconnected());
    assert_eq!(new.options().header("Authorization"), Some("Bearer rotated"));
}

#[rstest]
fn string_payload_is_parsed_and_stamped(signed_in: Harness) {
    let (received, on_message) = collector();
    let subscription = subscribe_user(&signed_in.manager, "42", on_message).unwrap();
    assert_eq!(subscription.channel(), "private-user.42");
    assert_eq!(signed_in.calls.lock().unwrap().subscribed, vec!["private-user.42"]);

    let connection = signed_in.manager.get_connection().unwrap();
    let delivered = connection.registry().dispatch(
        "private-user.42",
        WIRE_EVENT,
        json!(r#"{"notificationId":1,"text":"hi"}"#),
    );
    assert_eq!(delivered, 1);

    let received = received.lock().unwrap();
    let value = received[0].to_value();
    assert_eq!(value["notificationId"], json!(1));
    assert_eq!(value["text"], json!("hi"));
    let stamp = value["receivedAt"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    assert_eq!(value.as_object().unwrap().len(), 3);
}

#[rstest]
fn structured_payload_is_only_stamped(signed_in: Harness) {
    let (received, on_message) = collector();
    let _subscription = subscribe_user(&signed_in.manager, "42", on_message).unwrap();

    let connection = signed_in.manager.get_connection().unwrap();
    connection
        .registry()
        .dispatch("private-user.42", WIRE_EVENT, json!({"notificationId": 2}));

    let received = received.lock().unwrap();
    let mut value = received[0].to_value();
    let object = value.as_object_mut().unwrap();
    assert!(object.remove("receivedAt").is_some());
    assert_eq!(value, json!({"notificationId": 2}));
}

#[rstest]
fn unnamespaced_and_foreign_events_are_ignored(signed_in: Harness) {
    let (received, on_message) = collector();
    let _subscription = subscribe_user(&signed_in.manager, "42", on_message).unwrap();
    let connection = signed_in.manager.get_connection().unwrap();

    connection
        .registry()
        .dispatch("private-user.42", "App\\Events\\InvoicePaid", json!({}));
    connection
        .registry()
        .dispatch("private-user.7", WIRE_EVENT, json!({}));

    assert!(received.lock().unwrap().is_empty());
}

#[rstest]
fn repeated_subscribe_unsubscribe_leaves_nothing(
    signed_in: Harness,
    #[values(1, 5, 25)] cycles: usize,
) {
    let (received, on_message) = collector();

    for _ in 0..cycles {
        let subscription = subscribe_user(&signed_in.manager, "42", on_message.clone()).unwrap();
        subscription.unsubscribe();
    }

    let connection = signed_in.manager.get_connection().unwrap();
    assert_eq!(connection.registry().listener_count("private-user.42"), 0);
    assert!(connection.registry().channels().is_empty());
    assert_eq!(
        connection
            .registry()
            .dispatch("private-user.42", WIRE_EVENT, json!({"notificationId": 9})),
        0
    );
    assert!(received.lock().unwrap().is_empty());

    let calls = signed_in.calls.lock().unwrap();
    assert_eq!(calls.subscribed.len(), cycles);
    assert_eq!(calls.unsubscribed.len(), cycles);
}

#[rstest]
fn dropping_the_guard_leaves_the_channel(signed_in: Harness) {
    {
        let (_received, on_message) = collector();
        let _subscription = subscribe_user(&signed_in.manager, "42", on_message).unwrap();
    }
    let connection = signed_in.manager.get_connection().unwrap();
    assert_eq!(connection.registry().listener_count("private-user.42"), 0);
    assert_eq!(
        signed_in.calls.lock().unwrap().unsubscribed,
        vec!["private-user.42"]
    );
}

#[rstest]
fn consumers_share_one_transport_subscription(signed_in: Harness) {
    let (first_received, first) = collector();
    let (second_received, second) = collector();
    let a = subscribe_user(&signed_in.manager, "42", first).unwrap();
    let b = subscribe_user(&signed_in.manager, "42", second).unwrap();
    assert_eq!(signed_in.calls.lock().unwrap().subscribed.len(), 1);

    a.unsubscribe();
    assert!(signed_in.calls.lock().unwrap().unsubscribed.is_empty());

    let connection = signed_in.manager.get_connection().unwrap();
    connection
        .registry()
        .dispatch("private-user.42", WIRE_EVENT, json!({"notificationId": 3}));
    assert!(first_received.lock().unwrap().is_empty());
    assert_eq!(second_received.lock().unwrap()[0].notification_id(), Some(3));

    drop(b);
    assert_eq!(signed_in.calls.lock().unwrap().unsubscribed.len(), 1);
}

#[rstest]
fn channel_errors_keep_the_connection(signed_in: Harness) {
    let (_received, on_message) = collector();
    let _subscription = subscribe_user(&signed_in.manager, "42", on_message).unwrap();
    let before = signed_in.manager.get_connection().unwrap();

    before.registry().subscription_failed(
        "private-user.42",
        &ChannelError::Authorization("HTTP 403".to_string()),
    );

    let after = signed_in.manager.get_connection().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(!after.is_disconnected());
    assert_eq!(signed_in.calls.lock().unwrap().disconnects, 0);
}

#[rstest]
fn subscribe_without_token_is_a_silent_no_op(signed_out: Harness) {
    let (_received, on_message) = collector();
    assert!(subscribe_user(&signed_out.manager, "42", on_message).is_none());
    assert!(signed_out.calls.lock().unwrap().subscribed.is_empty());
}

#[rstest]
fn guard_outliving_a_reset_is_inert(signed_in: Harness) {
    let (_received, on_message) = collector();
    let subscription = subscribe_user(&signed_in.manager, "42", on_message).unwrap();

    signed_in.manager.reset();
    // The old connection is gone once the manager drops it.
    subscription.unsubscribe();
    assert!(signed_in.calls.lock().unwrap().unsubscribed.is_empty());
}

#[rstest]
fn guard_reports_whether_it_still_listens(signed_in: Harness) {
    let (_received, on_message) = collector();
    let subscription = subscribe_user(&signed_in.manager, "42", on_message).unwrap();
    assert!(subscription.is_active());

    signed_in.manager.reset();
    assert!(!subscription.is_active());
}

#[rstest]
fn binding_follows_the_user_id(signed_in: Harness) {
    let mut binding = UserBinding::new();
    let (_received, on_message) = collector();

    assert!(binding.bind(&signed_in.manager, "42", on_message.clone()));
    assert!(!binding.bind(&signed_in.manager, "42", on_message.clone()));
    assert!(binding.bind(&signed_in.manager, "7", on_message));

    let calls = signed_in.calls.lock().unwrap();
    assert_eq!(calls.subscribed, vec!["private-user.42", "private-user.7"]);
    assert_eq!(calls.unsubscribed, vec!["private-user.42"]);
    assert_eq!(binding.user_id(), Some("7"));
}

#[rstest]
fn binding_resubscribes_after_reset(signed_in: Harness) {
    let mut binding = UserBinding::new();
    let (received, on_message) = collector();
    assert!(binding.bind(&signed_in.manager, "42", on_message.clone()));

    signed_in.manager.reset();
    assert!(!binding.is_current("42"));
    assert!(binding.bind(&signed_in.manager, "42", on_message));
    assert_eq!(signed_in.calls.lock().unwrap().connects.len(), 2);

    let connection = signed_in.manager.get_connection().unwrap();
    connection
        .registry()
        .dispatch("private-user.42", WIRE_EVENT, json!({"notificationId": 9}));
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[rstest]
fn binding_waits_for_a_token(signed_out: Harness) {
    let mut binding = UserBinding::new();
    let (_received, on_message) = collector();
    assert!(!binding.bind(&signed_out.manager, "42", on_message.clone()));

    assert!(login(&signed_out.manager, "token-xyz"));
    assert!(binding.bind(&signed_out.manager, "42", on_message));
    assert_eq!(signed_out.calls.lock().unwrap().subscribed, vec!["private-user.42"]);

    binding.release();
    assert!(binding.subscription().is_none());
}

#[test]
fn user_channel_names() {
    assert_eq!(user_channel("42"), "user.42");
}

#[test]
fn raw_value_is_kept_when_payload_is_not_json() {
    let notification = Notification::receive(Value::String("not json".to_string()));
    let value = notification.to_value();
    assert_eq!(value["payload"], json!("not json"));
    assert!(value["receivedAt"].is_string());
}

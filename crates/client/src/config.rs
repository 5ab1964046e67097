//! Broadcaster endpoint configuration.
//!
//! Values come from environment variables at runtime (desktop), falling back
//! to the same variables captured at build time so web builds can be
//! configured as well:
//! - `LEXDESK_BROADCASTER`: "reverb" | "pusher" (default: "reverb")
//! - `LEXDESK_APP_KEY`: application key (default: "lexdesk")
//! - `LEXDESK_APP_CLUSTER`: cluster identifier (default: "mt1")
//! - `LEXDESK_WS_HOST`: socket host (default: `ws-{cluster}.pusher.com`)
//! - `LEXDESK_WS_PORT` / `LEXDESK_WSS_PORT`: (default: 80 / 443)
//! - `LEXDESK_FORCE_TLS`: "true" | "false" (default: "true")
//! - `LEXDESK_AUTH_ENDPOINT`: private channel authorization URL
//!   (default: "http://localhost:8000/broadcasting/auth")

use lexdesk_shared::{DEFAULT_EVENT_NAMESPACE, PROTOCOL_VERSION};

/// Storage key the bearer token is read from.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Broadcaster implementation on the other end of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcaster {
    Reverb,
    Pusher,
}

impl Broadcaster {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "reverb" => Some(Broadcaster::Reverb),
            "pusher" => Some(Broadcaster::Pusher),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Broadcaster::Reverb => "reverb",
            Broadcaster::Pusher => "pusher",
        }
    }
}

/// Socket transports the client may use. No polling fallback exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Ws,
    Wss,
}

impl TransportKind {
    pub fn scheme(&self) -> &'static str {
        match self {
            TransportKind::Ws => "ws",
            TransportKind::Wss => "wss",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastConfig {
    pub broadcaster: Broadcaster,
    pub app_key: String,
    pub cluster: String,
    pub ws_host: Option<String>,
    pub ws_port: u16,
    pub wss_port: u16,
    pub force_tls: bool,
    pub disable_stats: bool,
    pub enabled_transports: Vec<TransportKind>,
    pub auth_endpoint: String,
    /// Namespace applied to listener event names. `None` disables it.
    pub event_namespace: Option<String>,
    /// Storage key of the bearer token.
    pub token_key: String,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            broadcaster: Broadcaster::Reverb,
            app_key: "lexdesk".to_string(),
            cluster: "mt1".to_string(),
            ws_host: None,
            ws_port: 80,
            wss_port: 443,
            force_tls: true,
            disable_stats: true,
            enabled_transports: vec![TransportKind::Ws, TransportKind::Wss],
            auth_endpoint: "http://localhost:8000/broadcasting/auth".to_string(),
            event_namespace: Some(DEFAULT_EVENT_NAMESPACE.to_string()),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

impl BroadcastConfig {
    /// Build the configuration from `LEXDESK_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok().or_else(|| build_time(name)))
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let flag = |name: &str, default: bool| match lookup(name) {
            Some(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
            None => default,
        };
        let port = |name: &str, default: u16| {
            lookup(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            broadcaster: lookup("LEXDESK_BROADCASTER")
                .and_then(|v| Broadcaster::parse(&v))
                .unwrap_or(defaults.broadcaster),
            app_key: lookup("LEXDESK_APP_KEY").unwrap_or(defaults.app_key),
            cluster: lookup("LEXDESK_APP_CLUSTER").unwrap_or(defaults.cluster),
            ws_host: lookup("LEXDESK_WS_HOST").filter(|h| !h.trim().is_empty()),
            ws_port: port("LEXDESK_WS_PORT", defaults.ws_port),
            wss_port: port("LEXDESK_WSS_PORT", defaults.wss_port),
            force_tls: flag("LEXDESK_FORCE_TLS", defaults.force_tls),
            auth_endpoint: lookup("LEXDESK_AUTH_ENDPOINT").unwrap_or(defaults.auth_endpoint),
            ..defaults
        }
    }

    /// Host the socket connects to.
    pub fn host(&self) -> String {
        match &self.ws_host {
            Some(host) => host.clone(),
            None => format!("ws-{}.pusher.com", self.cluster),
        }
    }

    /// The transport actually used: TLS whenever forced or plain `ws` is not allowed.
    pub fn transport(&self) -> TransportKind {
        if self.force_tls || !self.enabled_transports.contains(&TransportKind::Ws) {
            TransportKind::Wss
        } else {
            TransportKind::Ws
        }
    }

    /// Full socket URL including the protocol query string.
    pub fn socket_url(&self) -> String {
        let transport = self.transport();
        let port = match transport {
            TransportKind::Ws => self.ws_port,
            TransportKind::Wss => self.wss_port,
        };
        format!(
            "{}://{}:{}/app/{}?protocol={}&client=lexdesk&version={}&flash=false",
            transport.scheme(),
            self.host(),
            port,
            urlencoding::encode(&self.app_key),
            PROTOCOL_VERSION,
            env!("CARGO_PKG_VERSION"),
        )
    }
}

fn build_time(name: &str) -> Option<String> {
    let value = match name {
        "LEXDESK_BROADCASTER" => option_env!("LEXDESK_BROADCASTER"),
        "LEXDESK_APP_KEY" => option_env!("LEXDESK_APP_KEY"),
        "LEXDESK_APP_CLUSTER" => option_env!("LEXDESK_APP_CLUSTER"),
        "LEXDESK_WS_HOST" => option_env!("LEXDESK_WS_HOST"),
        "LEXDESK_WS_PORT" => option_env!("LEXDESK_WS_PORT"),
        "LEXDESK_WSS_PORT" => option_env!("LEXDESK_WSS_PORT"),
        "LEXDESK_FORCE_TLS" => option_env!("LEXDESK_FORCE_TLS"),
        "LEXDESK_AUTH_ENDPOINT" => option_env!("LEXDESK_AUTH_ENDPOINT"),
        _ => None,
    };
    value.map(str::to_string)
}

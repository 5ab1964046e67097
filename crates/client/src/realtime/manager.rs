//! Token-gated, lazily built singleton connection.
//!
//! [`RealtimeManager`] owns at most one [`Connection`]. `get_connection`
//! builds it the first time a bearer token is present in storage and
//! returns the same handle until `reset` is called. The manager never
//! watches storage: callers reset it whenever the token changes (see
//! [`crate::auth_session`]).
//!
//! A process-wide instance lives in a module-scoped holder installed once
//! with [`install`]; tests build their own managers with a fake
//! [`TransportFactory`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;

use super::channels::ChannelRegistry;
use super::connection::Connection;
use super::error::RealtimeError;
use super::transport::{ConnectOptions, PusherTransportFactory, TransportFactory};
use crate::config::BroadcastConfig;
use crate::storage::{PersistentStorage, TokenStore};

pub struct RealtimeManager {
    config: BroadcastConfig,
    storage: Arc<dyn TokenStore>,
    factory: Arc<dyn TransportFactory>,
    slot: Mutex<Option<Arc<Connection>>>,
}

impl RealtimeManager {
    pub fn new(
        config: BroadcastConfig,
        storage: Arc<dyn TokenStore>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            config,
            storage,
            factory,
            slot: Mutex::new(None),
        }
    }

    /// Environment configuration, persistent token storage and the Pusher
    /// transport.
    pub fn from_env() -> Self {
        Self::new(
            BroadcastConfig::from_env(),
            Arc::new(PersistentStorage::new()),
            Arc::new(PusherTransportFactory),
        )
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn TokenStore> {
        &self.storage
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<Connection>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_connection(&self) -> bool {
        self.slot().is_some()
    }

    fn token(&self) -> Option<String> {
        self.storage
            .get_item(&self.config.token_key)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    /// The live connection, built on first use. `None` while no token is
    /// stored or when the transport cannot be started.
    pub fn get_connection(&self) -> Option<Arc<Connection>> {
        let mut slot = self.slot();
        if let Some(connection) = slot.as_ref() {
            return Some(connection.clone());
        }

        let Some(token) = self.token() else {
            crate::log_warn!("No auth token found, realtime connection not created");
            return None;
        };

        let options = ConnectOptions::new(&self.config, &token);
        let registry = Arc::new(ChannelRegistry::new(self.config.event_namespace.clone()));

        match self.factory.connect(options.clone(), registry.clone()) {
            Ok(transport) => {
                let connection = Arc::new(Connection::new(options, registry, transport));
                crate::log_info!(
                    "Realtime connection {} created ({})",
                    connection.id(),
                    self.config.broadcaster.as_str()
                );
                *slot = Some(connection.clone());
                Some(connection)
            }
            Err(e) => {
                crate::log_error!("Failed to create realtime connection: {}", e);
                None
            }
        }
    }

    /// Disconnect the live connection, if any, and forget it so the next
    /// `get_connection` rebuilds from the current token.
    pub fn reset(&self) {
        let previous = self.slot().take();
        if let Some(connection) = previous {
            crate::log_info!("Resetting realtime connection {}", connection.id());
            connection.disconnect();
        }
    }
}

static GLOBAL: OnceCell<RealtimeManager> = OnceCell::new();

/// Install the process-wide manager. Fails if one is already installed.
pub fn install(manager: RealtimeManager) -> Result<&'static RealtimeManager, RealtimeError> {
    GLOBAL
        .set(manager)
        .map_err(|_| RealtimeError::AlreadyInstalled)?;
    Ok(global())
}

/// The process-wide manager, built from the environment on first use when
/// none was installed.
pub fn global() -> &'static RealtimeManager {
    GLOBAL.get_or_init(RealtimeManager::from_env)
}

/// [`RealtimeManager::get_connection`] on the process-wide manager.
pub fn get_connection() -> Option<Arc<Connection>> {
    global().get_connection()
}

/// [`RealtimeManager::reset`] on the process-wide manager.
pub fn reset() {
    global().reset()
}

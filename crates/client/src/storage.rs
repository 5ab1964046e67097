//! Cross-platform key-value storage backing the bearer token.
//!
//! [`TokenStore`] is the narrow interface the realtime manager reads from.
//! Two implementations ship:
//! - [`PersistentStorage`]
//!   - Web: `localStorage`
//!   - Desktop: one file per key in the platform-appropriate config directory:
//!     - Linux: `~/.config/lexdesk/`
//!     - macOS: `~/Library/Application Support/lexdesk/`
//!     - Windows: `%APPDATA%\lexdesk\`
//! - [`MemoryStorage`], process-local, used by tests and previews.
//!
//! All operations are synchronous; the manager relies on a write being
//! visible to the very next read.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::{de::DeserializeOwned, Serialize};

/// Synchronous key-value store.
pub trait TokenStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Returns `true` if the write succeeded.
    fn set_item(&self, key: &str, value: &str) -> bool;

    fn remove_item(&self, key: &str);

    /// Write several entries; stops at the first failure.
    fn set_items(&self, entries: &[(&str, &str)]) -> bool {
        entries.iter().all(|(key, value)| self.set_item(key, value))
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage.set_item(key, value);
        storage
    }
}

impl TokenStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> bool {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        true
    }

    fn remove_item(&self, key: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Platform storage: `localStorage` on the web, files on desktop.
///
/// [`TokenStore`] items are raw strings; [`save`](Self::save) and
/// [`load`](Self::load) layer JSON on top for typed values.
#[derive(Debug, Clone, Default)]
pub struct PersistentStorage {
    #[cfg(not(target_arch = "wasm32"))]
    root: Option<std::path::PathBuf>,
}

impl PersistentStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store files under `root` instead of the platform config directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_root(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Save a value as JSON. Returns `true` if the operation succeeded.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.save_raw(key, &json),
            Err(_) => false,
        }
    }

    /// Load a JSON value. `None` if the key is missing or does not decode.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.load_raw(key)?;
        serde_json::from_str(&json).ok()
    }
}

/// Items are stored verbatim so values written by other code (the web
/// login form calling `localStorage.setItem`) read back unchanged.
impl TokenStore for PersistentStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.load_raw(key)
    }

    fn set_item(&self, key: &str, value: &str) -> bool {
        self.save_raw(key, value)
    }

    fn remove_item(&self, key: &str) {
        self.remove_raw(key);
    }
}

// =========================================
// Web (WASM) implementation
// =========================================

#[cfg(target_arch = "wasm32")]
impl PersistentStorage {
    fn local_storage(&self) -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    fn save_raw(&self, key: &str, value: &str) -> bool {
        self.local_storage()
            .map(|storage| storage.set_item(key, value).is_ok())
            .unwrap_or(false)
    }

    fn load_raw(&self, key: &str) -> Option<String> {
        self.local_storage()?.get_item(key).ok()?
    }

    fn remove_raw(&self, key: &str) {
        if let Some(storage) = self.local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

// =========================================
// Desktop (native) implementation
// =========================================

#[cfg(not(target_arch = "wasm32"))]
impl PersistentStorage {
    fn dir(&self) -> Option<std::path::PathBuf> {
        let dir = match &self.root {
            Some(root) => root.clone(),
            None => dirs::config_dir()?.join("lexdesk"),
        };

        if !dir.exists() {
            std::fs::create_dir_all(&dir).ok()?;
        }

        Some(dir)
    }

    fn file_path(&self, key: &str) -> Option<std::path::PathBuf> {
        // Sanitize key to be a valid filename
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        Some(self.dir()?.join(format!("{}.json", safe_key)))
    }

    fn save_raw(&self, key: &str, value: &str) -> bool {
        let Some(path) = self.file_path(key) else {
            return false;
        };
        std::fs::write(path, value).is_ok()
    }

    fn load_raw(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.file_path(key)?).ok()
    }

    fn remove_raw(&self, key: &str) {
        if let Some(path) = self.file_path(key) {
            let _ = std::fs::remove_file(path);
        }
    }
}

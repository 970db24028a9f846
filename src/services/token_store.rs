//! Extension-local storage.
//!
//! A small JSON key-value file standing in for the browser's extension
//! storage area. The `authToken` key is mirrored into memory and published on
//! a watch channel so holders stay in sync without re-reading storage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::platform;
use crate::types::errors::StorageError;

/// Storage key holding the bearer token.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Key-value storage with an observable auth token.
pub struct TokenStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, Value>>,
    token_tx: watch::Sender<Option<String>>,
}

impl TokenStore {
    /// Opens the storage file at `path`, starting empty if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries: BTreeMap<String, Value> = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| StorageError::IoError(format!("Failed to read storage: {}", e)))?;
            serde_json::from_str(&content).map_err(|e| {
                StorageError::SerializationError(format!("Failed to parse storage: {}", e))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self::with_entries(Some(path), entries))
    }

    /// Opens `local_storage.json` under the platform data directory.
    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(platform::get_data_dir().join("local_storage.json"))
    }

    /// Storage that is never written to disk.
    pub fn in_memory() -> Self {
        Self::with_entries(None, BTreeMap::new())
    }

    fn with_entries(path: Option<PathBuf>, entries: BTreeMap<String, Value>) -> Self {
        let token = entries
            .get(AUTH_TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        let (token_tx, _) = watch::channel(token);
        Self {
            path,
            entries: Mutex::new(entries),
            token_tx,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.insert(key.to_string(), value.clone());
            self.persist(&entries)?;
        }
        if key == AUTH_TOKEN_KEY {
            self.publish_token(value.as_str().map(str::to_string));
        }
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if entries.remove(key).is_none() {
                return Ok(());
            }
            self.persist(&entries)?;
        }
        if key == AUTH_TOKEN_KEY {
            self.publish_token(None);
        }
        Ok(())
    }

    /// Current in-memory copy of the auth token.
    pub fn auth_token(&self) -> Option<String> {
        self.token_tx.borrow().clone()
    }

    pub fn set_auth_token(&self, token: &str) -> Result<(), StorageError> {
        self.set(AUTH_TOKEN_KEY, Value::String(token.to_string()))
    }

    pub fn clear_auth_token(&self) -> Result<(), StorageError> {
        self.remove(AUTH_TOKEN_KEY)
    }

    /// Receiver that observes every auth token change.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token_tx.subscribe()
    }

    fn publish_token(&self, token: Option<String>) {
        debug!(present = token.is_some(), "auth token changed");
        self.token_tx.send_replace(token);
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::IoError(format!("Failed to create storage directory: {}", e))
            })?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize storage: {}", e))
        })?;
        fs::write(path, json).map_err(|e| {
            warn!(path = %path.display(), "failed to write local storage");
            StorageError::IoError(format!("Failed to write storage: {}", e))
        })
    }
}

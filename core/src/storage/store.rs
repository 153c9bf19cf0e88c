use std::fmt::Debug;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Error type for key-value store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing the value would exceed the store's capacity
    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
    /// The stored document could not be decoded
    #[error("Corrupt document under '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Browser-local-storage style capability: string values under string keys.
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Type alias for Arc-wrapped KeyValueStore trait objects
pub type StoreRef = Arc<dyn KeyValueStore>;

/// Load and decode the JSON document under `key`.
pub fn load_document<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn save_document<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    debug!("Saving document '{}' ({} bytes)", key, raw.len());
    store.set(key, &raw)
}

/// Erase the document under `key`.
pub fn clear_document(store: &dyn KeyValueStore, key: &str) -> Result<(), StoreError> {
    debug!("Clearing document '{}'", key);
    store.remove(key)
}

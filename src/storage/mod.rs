//! Persistent key-value store
//!
//! A thin, synchronous, string-keyed port over whatever durable medium the
//! host provides. Every store in this crate owns exactly one key (see
//! [`keys`]) and rewrites its whole value on each mutation.

pub mod keys;
mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::ClientConfig;
use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Durable, synchronous, string-keyed storage.
///
/// Implementations must replace a value atomically: a reader observes either
/// the previous value or the new one, never a partial write.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// The store `config` asks for: a [`FileStore`] under `storage_dir`, or a
/// [`MemoryStore`] when no directory is configured
pub fn open_store(config: &ClientConfig) -> Result<Arc<dyn KeyValueStore>> {
    match &config.storage_dir {
        Some(dir) => {
            info!(path = %dir.display(), "Using file-backed storage");
            Ok(Arc::new(FileStore::open(dir)?))
        }
        None => {
            warn!("No storage directory configured, state will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Load and deserialize a key, falling back to `T::default()` when the key is
/// missing or its content no longer parses.
pub fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Discarding unreadable persisted value");
            Ok(T::default())
        }
    }
}

/// Serialize the complete value and store it under `key` in one write.
pub fn write_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_read_missing_key_yields_default() {
        let store = MemoryStore::new();
        let value: Vec<String> = read_json(&store, "absent").unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_read_corrupt_value_yields_default() {
        let store = MemoryStore::new();
        store.set("broken", "{not json").unwrap();
        let value: HashMap<String, String> = read_json(&store, "broken").unwrap();
        assert!(value.is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();
        write_json(&store, "list", &vec![1, 2, 3]).unwrap();
        let value: Vec<i32> = read_json(&store, "list").unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn test_open_store_follows_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ClientConfig::default().with_storage_dir(dir.path());
        let store = open_store(&config).unwrap();
        store.set(keys::CART, "[]").unwrap();
        assert!(dir.path().join("cart.v1.json").exists());

        let store = open_store(&ClientConfig::default()).unwrap();
        assert_eq!(store.get(keys::CART).unwrap(), None);
    }
}

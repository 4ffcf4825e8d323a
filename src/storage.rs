use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::StoreError;

// 1. KeyValueStore Contract
/// KeyValueStore
///
/// The abstract contract of the client's local key-value store (the browser's
/// local storage in the web build). The session and the local bindings are
/// written through this trait only, so tests swap in a fresh `MemoryStore`.
///
/// There are no transactions: a multi-key update is a sequence of independent
/// `set` calls.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored string, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Fails when the store refuses the write (quota exhausted).
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str);
}

// 2. The In-Memory Implementation
/// MemoryStore
///
/// Process-wide in-memory store. An optional byte quota mirrors the browser
/// store's behaviour of rejecting writes once it is full, which matters for the
/// data-URL payloads the company asset bindings keep.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects any write pushing the total size of keys and values
    /// above `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total bytes held (keys plus values).
    pub fn used_bytes(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        if let Some(quota) = self.quota_bytes {
            let current: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = current + key.len() + value.len();
            if needed > quota {
                tracing::warn!(key, needed, quota, "local store quota exceeded");
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }
}

/// read_json
///
/// Reads and parses a JSON value stored under `key`, falling back to `fallback`
/// when the key is absent or holds something unparseable. Stale or hand-edited
/// entries must never break a page load.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, fallback: T) -> T {
    let Some(raw) = store.get(key) else {
        return fallback;
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(key, error = %e, "ignoring unparseable local entry");
            fallback
        }
    }
}

/// StoreState
///
/// The concrete type used to share the local store across the client.
pub type StoreState = Arc<dyn KeyValueStore>;

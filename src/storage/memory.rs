//! In-process key-value store
//!
//! Backs unit tests and ephemeral sessions with the same contract as the
//! file store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{OwnedMutexGuard, RwLock};

use super::{KeyLocks, KeyValueStore, StorageError};

/// Volatile store holding documents in a HashMap
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    locks: KeyLocks,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            locks: KeyLocks::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(key).await
    }
}

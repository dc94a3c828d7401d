//! Durable key-value storage for the classification data lifecycle
//!
//! Every component persists whole JSON documents under a small set of
//! logical keys. Absence of a key is a normal condition (`Ok(None)`), kept
//! distinct from an operation that actually failed (`Err`). Mutations are
//! read-modify-write over the full document, so each key carries a write
//! lock that callers hold across the whole sequence.

pub mod file;
pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Logical storage keys shared by the lifecycle components
pub mod keys {
    /// Classification history, most-recent-first, capped
    pub const CLASSIFICATION_HISTORY: &str = "classification_history";
    /// Curated training sample set (paired arrays)
    pub const TRAINING_DATA: &str = "training_data";
    /// Leaderboard entries, unique by username
    pub const USER_RANKINGS: &str = "user_rankings";
    /// Logged-in user profile
    pub const USER: &str = "user";
}

/// Error raised by storage operations.
///
/// A missing key is not an error: `get` returns `Ok(None)` so callers can
/// tell "nothing stored yet" apart from an operation that failed.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode stored document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable string-keyed document storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the document stored under `key`, or `None` if there is none
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the document stored under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the document stored under `key`. Removing a missing key is
    /// not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Acquire the write lock for `key`. Every read-modify-write sequence
    /// must hold the guard for its full duration so two concurrent
    /// mutations of the same key cannot interleave and lose an update.
    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()>;
}

/// Per-key mutex registry backing [`KeyValueStore::lock_key`]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

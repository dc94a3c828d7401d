//! Classification history
//!
//! Append-only, capped log of classification outcomes, most-recent-first.
//! Every append rewrites the whole stored sequence; an unreadable payload
//! reads as an empty history rather than an error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::MAX_HISTORY_ITEMS;
use crate::storage::{keys, KeyValueStore, StorageError};
use crate::types::ClassificationRecord;

/// Persistent classification log
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Insert a record at the head and truncate to the capacity bound,
    /// discarding the oldest entries. The history key's write lock is held
    /// across the whole read-modify-write.
    pub async fn append(&self, record: &ClassificationRecord) -> Result<(), StorageError> {
        let _guard = self.store.lock_key(keys::CLASSIFICATION_HISTORY).await;

        let mut history = self.load().await?;
        history.insert(0, record.clone());
        history.truncate(MAX_HISTORY_ITEMS);

        let payload = serde_json::to_string_pretty(&history)?;
        self.store.set(keys::CLASSIFICATION_HISTORY, &payload).await?;
        debug!("History now holds {} records", history.len());
        Ok(())
    }

    /// Full stored history, most-recent-first. Missing or unreadable
    /// payloads read as empty; only an I/O failure is an error.
    pub async fn list(&self) -> Result<Vec<ClassificationRecord>, StorageError> {
        self.load().await
    }

    /// Remove the stored history
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(keys::CLASSIFICATION_HISTORY).await
    }

    async fn load(&self) -> Result<Vec<ClassificationRecord>, StorageError> {
        let Some(payload) = self.store.get(keys::CLASSIFICATION_HISTORY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&payload) {
            Ok(history) => Ok(history),
            Err(e) => {
                warn!("Discarding unreadable classification history: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

/// Keep only records of `category`, preserving order. Pure, no I/O.
pub fn filter_by_category<'a>(
    records: &'a [ClassificationRecord],
    category: &str,
) -> Vec<&'a ClassificationRecord> {
    records.iter().filter(|r| r.category == category).collect()
}

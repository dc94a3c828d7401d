//! Training sample curation
//!
//! Maintains the paired (image reference, label) training set used for
//! incremental model improvement. Only high-confidence classifications are
//! admitted, so the set does not reinforce the model's own mistakes, and
//! the set is capped with oldest-first eviction.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{CONFIDENCE_THRESHOLD_HIGH, MAX_TRAINING_SAMPLES};
use crate::storage::{keys, KeyValueStore, StorageError};
use crate::types::ClassificationRecord;

/// Paired (image reference, label) training set.
///
/// Index `i` of `image_refs` always labels index `i` of `labels`; the two
/// arrays grow and shrink together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingSampleSet {
    #[serde(rename = "images")]
    pub image_refs: Vec<String>,
    pub labels: Vec<String>,
}

impl TrainingSampleSet {
    pub fn len(&self) -> usize {
        self.image_refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_refs.is_empty()
    }

    /// Occurrences of each label across the set
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for label in &self.labels {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Exclusive owner of the persisted training set
pub struct SampleCurator {
    store: Arc<dyn KeyValueStore>,
}

impl SampleCurator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Offer a classification outcome to the training set.
    ///
    /// Admitted only at or above the high-confidence gate — this is the
    /// only admission path. Returns whether the record was added. The
    /// training key's write lock is held across the read-modify-write.
    pub async fn maybe_add(&self, record: &ClassificationRecord) -> Result<bool, StorageError> {
        if record.confidence < CONFIDENCE_THRESHOLD_HIGH {
            return Ok(false);
        }

        let _guard = self.store.lock_key(keys::TRAINING_DATA).await;

        let mut samples = self.load().await?;
        samples.image_refs.push(record.image_ref.clone());
        samples.labels.push(record.category.clone());

        if samples.image_refs.len() > MAX_TRAINING_SAMPLES {
            // Evict oldest-first, both arrays in lockstep
            let excess = samples.image_refs.len() - MAX_TRAINING_SAMPLES;
            samples.image_refs.drain(..excess);
            samples.labels.drain(..excess);
        }

        let payload = serde_json::to_string_pretty(&samples)?;
        self.store.set(keys::TRAINING_DATA, &payload).await?;
        debug!("Training set holds {} samples", samples.len());
        Ok(true)
    }

    /// Current training set; empty when nothing is persisted or the
    /// payload is unreadable.
    pub async fn get(&self) -> Result<TrainingSampleSet, StorageError> {
        self.load().await
    }

    /// Remove the stored training set
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(keys::TRAINING_DATA).await
    }

    async fn load(&self) -> Result<TrainingSampleSet, StorageError> {
        let Some(payload) = self.store.get(keys::TRAINING_DATA).await? else {
            return Ok(TrainingSampleSet::default());
        };
        match serde_json::from_str(&payload) {
            Ok(samples) => Ok(samples),
            Err(e) => {
                warn!("Discarding unreadable training set: {}", e);
                Ok(TrainingSampleSet::default())
            }
        }
    }
}

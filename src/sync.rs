//! Remote training sync
//!
//! Fire-and-forget collaborators: low-confidence images are offered to a
//! remote trainer for supplementary learning, and the local history can be
//! pushed to cloud storage. Failures are reported to the immediate caller
//! and never retried.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::history::HistoryStore;
use crate::types::ClassificationRecord;

/// Error raised by a sync collaborator
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("upload failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] crate::storage::StorageError),
}

/// Remote sink for supplementary training images
#[async_trait]
pub trait TrainingUploader: Send + Sync {
    /// Offer one image and its classification to the remote trainer
    async fn upload(
        &self,
        image_ref: &str,
        record: &ClassificationRecord,
    ) -> Result<(), SyncError>;
}

/// Stand-in uploader: logs the offer and reports success
pub struct SimulatedUploader;

#[async_trait]
impl TrainingUploader for SimulatedUploader {
    async fn upload(
        &self,
        image_ref: &str,
        record: &ClassificationRecord,
    ) -> Result<(), SyncError> {
        info!(
            "Uploading {} ({} @ {:.2}) for supplementary training (simulated)",
            image_ref, record.category, record.confidence
        );
        Ok(())
    }
}

/// Uploader posting a multipart form to a configured endpoint
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TrainingUploader for HttpUploader {
    async fn upload(
        &self,
        image_ref: &str,
        record: &ClassificationRecord,
    ) -> Result<(), SyncError> {
        let form = reqwest::multipart::Form::new()
            .text("image", image_ref.to_string())
            .text("category", record.category.clone())
            .text("confidence", record.confidence.to_string())
            .text("timestamp", record.timestamp.to_rfc3339());

        self.client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        info!("Uploaded {} to {}", image_ref, self.endpoint);
        Ok(())
    }
}

/// Result of a cloud history sync
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub synced: usize,
}

/// Push the full local history to cloud storage. Simulated: counts what
/// would be sent without leaving the device.
pub async fn sync_history(history: &HistoryStore) -> Result<SyncReport, SyncError> {
    let records = history.list().await?;
    info!("Synced {} history items to cloud (simulated)", records.len());
    Ok(SyncReport {
        synced: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sync_counts_history_items() {
        let store = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
        let history = HistoryStore::new(store);

        let report = sync_history(&history).await.unwrap();
        assert_eq!(report.synced, 0);

        for n in 0..3 {
            history
                .append(&ClassificationRecord {
                    id: format!("rec-{n}"),
                    image_ref: format!("photo-{n}.jpg"),
                    category: "Paper".to_string(),
                    confidence: 0.9,
                    secondary_category: None,
                    secondary_confidence: None,
                    all_probabilities: vec![0.9, 0.1],
                    timestamp: Utc::now(),
                })
                .await
                .unwrap();
        }

        let report = sync_history(&history).await.unwrap();
        assert_eq!(report.synced, 3);
    }
}

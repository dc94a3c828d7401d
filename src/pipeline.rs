//! Classification event flow
//!
//! One classification event flows from the engine into the history
//! (always), into the training set (high confidence only), and to the
//! remote trainer (low confidence only, fire-and-forget).

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::CONFIDENCE_THRESHOLD_LOW;
use crate::engine::ClassificationEngine;
use crate::history::HistoryStore;
use crate::storage::StorageError;
use crate::sync::TrainingUploader;
use crate::training::SampleCurator;
use crate::types::{ClassificationRecord, StorageStats};

/// Runs the full persistence flow for classification events
pub struct ClassificationPipeline {
    engine: Arc<dyn ClassificationEngine>,
    history: Arc<HistoryStore>,
    curator: Arc<SampleCurator>,
    uploader: Arc<dyn TrainingUploader>,
}

impl ClassificationPipeline {
    pub fn new(
        engine: Arc<dyn ClassificationEngine>,
        history: Arc<HistoryStore>,
        curator: Arc<SampleCurator>,
        uploader: Arc<dyn TrainingUploader>,
    ) -> Self {
        Self {
            engine,
            history,
            curator,
            uploader,
        }
    }

    /// Classify one image and persist the outcome.
    ///
    /// The engine is initialized lazily on first use. The record always
    /// lands in the history; the curator applies its own confidence gate;
    /// a low-confidence image is additionally offered to the remote
    /// trainer on a detached task, whose failure never fails the scan.
    pub async fn process(&self, image_ref: &str) -> Result<ClassificationRecord> {
        if !self.engine.is_ready() {
            self.engine.initialize().await?;
        }

        let verdict = self.engine.classify(image_ref).await?;
        let record = ClassificationRecord {
            id: Uuid::new_v4().to_string(),
            image_ref: image_ref.to_string(),
            category: verdict.category,
            confidence: verdict.confidence,
            secondary_category: verdict.secondary_category,
            secondary_confidence: verdict.secondary_confidence,
            all_probabilities: verdict.all_probabilities,
            timestamp: Utc::now(),
        };

        self.history.append(&record).await?;

        if self.curator.maybe_add(&record).await? {
            info!(
                "Curated {} sample at confidence {:.2}",
                record.category, record.confidence
            );
        }

        if record.confidence < CONFIDENCE_THRESHOLD_LOW {
            let uploader = Arc::clone(&self.uploader);
            let upload_record = record.clone();
            tokio::spawn(async move {
                if let Err(e) = uploader
                    .upload(&upload_record.image_ref, &upload_record)
                    .await
                {
                    warn!("Supplementary upload failed: {}", e);
                }
            });
        }

        Ok(record)
    }

    /// Storage overview: totals plus the distinct categories seen in the
    /// history, first-seen order.
    pub async fn storage_stats(&self) -> Result<StorageStats, StorageError> {
        let (history, samples) = futures::join!(self.history.list(), self.curator.get());
        let history = history?;
        let samples = samples?;

        let mut categories: Vec<String> = Vec::new();
        for record in &history {
            if !categories.contains(&record.category) {
                categories.push(record.category.clone());
            }
        }

        Ok(StorageStats {
            total_classifications: history.len(),
            training_data_size: samples.len(),
            categories,
        })
    }

    /// Remove every document this pipeline owns. Reset path.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.history.clear().await?;
        self.curator.clear().await?;
        info!("Cleared classification history and training data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulatedEngine;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::sync::{SimulatedUploader, SyncError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingUploader {
        uploads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TrainingUploader for CountingUploader {
        async fn upload(
            &self,
            _image_ref: &str,
            _record: &ClassificationRecord,
        ) -> Result<(), SyncError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn pipeline_with(
        engine: Arc<dyn ClassificationEngine>,
        uploader: Arc<dyn TrainingUploader>,
    ) -> (Arc<HistoryStore>, Arc<SampleCurator>, ClassificationPipeline) {
        let store = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
        let history = Arc::new(HistoryStore::new(store.clone()));
        let curator = Arc::new(SampleCurator::new(store));
        let pipeline =
            ClassificationPipeline::new(engine, history.clone(), curator.clone(), uploader);
        (history, curator, pipeline)
    }

    #[tokio::test]
    async fn test_every_scan_lands_in_history() {
        let (history, _curator, pipeline) =
            pipeline_with(Arc::new(SimulatedEngine::new()), Arc::new(SimulatedUploader));

        for n in 0..5 {
            let record = pipeline.process(&format!("photo-{n}.jpg")).await.unwrap();
            assert!(record.confidence >= 0.0 && record.confidence <= 1.0);
        }

        assert_eq!(history.list().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_degraded_scans_are_uploaded_but_never_curated() {
        let uploader = Arc::new(CountingUploader {
            uploads: AtomicUsize::new(0),
        });
        let (_history, curator, pipeline) =
            pipeline_with(Arc::new(SimulatedEngine::degraded()), uploader.clone());

        // Degraded confidence is always in [0.3, 0.7): below both the
        // curation gate and the upload gate.
        for n in 0..8 {
            pipeline.process(&format!("photo-{n}.jpg")).await.unwrap();
        }

        assert!(curator.get().await.unwrap().is_empty());

        // Uploads run on detached tasks; give them a moment to land.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(uploader.uploads.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_storage_stats() {
        let (history, curator, pipeline) =
            pipeline_with(Arc::new(SimulatedEngine::new()), Arc::new(SimulatedUploader));

        let stats = pipeline.storage_stats().await.unwrap();
        assert_eq!(stats.total_classifications, 0);
        assert_eq!(stats.training_data_size, 0);
        assert!(stats.categories.is_empty());

        for n in 0..6 {
            pipeline.process(&format!("photo-{n}.jpg")).await.unwrap();
        }

        let stats = pipeline.storage_stats().await.unwrap();
        assert_eq!(stats.total_classifications, 6);
        assert_eq!(stats.training_data_size, curator.get().await.unwrap().len());
        for category in &stats.categories {
            assert!(history
                .list()
                .await
                .unwrap()
                .iter()
                .any(|r| &r.category == category));
        }
    }

    #[tokio::test]
    async fn test_clear_all_resets_both_documents() {
        let (history, curator, pipeline) =
            pipeline_with(Arc::new(SimulatedEngine::new()), Arc::new(SimulatedUploader));

        for n in 0..4 {
            pipeline.process(&format!("photo-{n}.jpg")).await.unwrap();
        }
        assert!(!history.list().await.unwrap().is_empty());

        pipeline.clear_all().await.unwrap();
        assert!(history.list().await.unwrap().is_empty());
        assert!(curator.get().await.unwrap().is_empty());
    }
}

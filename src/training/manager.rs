//! Training orchestration
//!
//! Gates training runs on sample volume, drives the engine, and exposes
//! the retraining-readiness signal and curated-set statistics to the UI
//! layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::MIN_TRAINING_SAMPLES;
use crate::engine::{ClassificationEngine, EngineError};
use crate::storage::StorageError;

use super::curator::SampleCurator;
use super::evaluator::{assess_retraining, RetrainingAssessment};

/// Phases reported while a training run progresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPhase {
    Preparing,
    Training,
    Complete,
}

/// Outcome of a completed training run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSuccess {
    pub samples_count: usize,
    pub final_loss: f64,
    pub final_accuracy: f64,
}

/// Why a training run did not complete
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("not enough training data: need at least {required} samples, have {available}")]
    NotEnoughSamples { available: usize, required: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),
}

/// Curated-set statistics for display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingStats {
    pub total_samples: usize,
    pub category_counts: HashMap<String, usize>,
    pub model_ready: bool,
}

/// Advisory schedule for automatic retraining
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrainingSchedule {
    pub interval: Duration,
    pub next_training: DateTime<Utc>,
}

/// Drives training runs over the curated sample set
pub struct TrainingManager {
    curator: Arc<SampleCurator>,
    engine: Arc<dyn ClassificationEngine>,
}

impl TrainingManager {
    pub fn new(curator: Arc<SampleCurator>, engine: Arc<dyn ClassificationEngine>) -> Self {
        Self { curator, engine }
    }

    /// Run one training cycle over the curated set.
    ///
    /// Fails with [`TrainingError::NotEnoughSamples`] before touching the
    /// engine when the set is below the minimum; otherwise reports phase
    /// transitions through `on_progress` and returns the engine's final
    /// metrics.
    pub async fn start_training(
        &self,
        mut on_progress: impl FnMut(TrainingPhase),
    ) -> Result<TrainingSuccess, TrainingError> {
        let samples = self.curator.get().await?;
        if samples.len() < MIN_TRAINING_SAMPLES {
            return Err(TrainingError::NotEnoughSamples {
                available: samples.len(),
                required: MIN_TRAINING_SAMPLES,
            });
        }

        on_progress(TrainingPhase::Preparing);
        info!("Starting training over {} samples", samples.len());

        on_progress(TrainingPhase::Training);
        let report = self.engine.train(&samples).await?;

        on_progress(TrainingPhase::Complete);
        info!(
            "Training complete: loss = {:.4}, accuracy = {:.4}",
            report.final_loss, report.final_accuracy
        );

        Ok(TrainingSuccess {
            samples_count: samples.len(),
            final_loss: report.final_loss,
            final_accuracy: report.final_accuracy,
        })
    }

    /// Whether the curated set warrants retraining
    pub async fn needs_retraining(&self) -> Result<RetrainingAssessment, StorageError> {
        let samples = self.curator.get().await?;
        Ok(assess_retraining(&samples))
    }

    /// Curated-set statistics plus engine readiness
    pub async fn stats(&self) -> Result<TrainingStats, StorageError> {
        let samples = self.curator.get().await?;
        Ok(TrainingStats {
            total_samples: samples.len(),
            category_counts: samples.category_counts(),
            model_ready: self.engine.is_ready(),
        })
    }

    /// Advisory schedule for the next automatic retraining pass. Nothing
    /// is armed here; the host platform owns background execution.
    pub fn schedule_retraining(&self, interval: Duration) -> RetrainingSchedule {
        let next_training = Utc::now()
            + chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::days(1));
        info!("Next automatic retraining advised for {}", next_training);
        RetrainingSchedule {
            interval,
            next_training,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulatedEngine;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::types::ClassificationRecord;
    use chrono::Utc;

    fn record(n: usize, category: &str) -> ClassificationRecord {
        ClassificationRecord {
            id: format!("rec-{n}"),
            image_ref: format!("photo-{n}.jpg"),
            category: category.to_string(),
            confidence: 0.92,
            secondary_category: None,
            secondary_confidence: None,
            all_probabilities: vec![0.92, 0.08],
            timestamp: Utc::now(),
        }
    }

    fn manager_on_memory() -> (Arc<SampleCurator>, TrainingManager) {
        let store = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
        let curator = Arc::new(SampleCurator::new(store));
        let engine = Arc::new(SimulatedEngine::new());
        let manager = TrainingManager::new(curator.clone(), engine);
        (curator, manager)
    }

    #[tokio::test]
    async fn test_insufficient_samples_is_a_structured_failure() {
        let (curator, manager) = manager_on_memory();

        for n in 0..MIN_TRAINING_SAMPLES - 1 {
            curator.maybe_add(&record(n, "Plastic")).await.unwrap();
        }

        let mut phases = Vec::new();
        let err = manager
            .start_training(|phase| phases.push(phase))
            .await
            .unwrap_err();

        match err {
            TrainingError::NotEnoughSamples {
                available,
                required,
            } => {
                assert_eq!(available, MIN_TRAINING_SAMPLES - 1);
                assert_eq!(required, MIN_TRAINING_SAMPLES);
            }
            other => panic!("unexpected error: {other}"),
        }
        // The engine was never reached
        assert!(phases.is_empty());
    }

    #[tokio::test]
    async fn test_training_runs_through_all_phases() {
        let (curator, manager) = manager_on_memory();

        for n in 0..MIN_TRAINING_SAMPLES {
            let category = if n % 2 == 0 { "Paper" } else { "Glass" };
            curator.maybe_add(&record(n, category)).await.unwrap();
        }

        let mut phases = Vec::new();
        let success = manager
            .start_training(|phase| phases.push(phase))
            .await
            .unwrap();

        assert_eq!(
            phases,
            vec![
                TrainingPhase::Preparing,
                TrainingPhase::Training,
                TrainingPhase::Complete
            ]
        );
        assert_eq!(success.samples_count, MIN_TRAINING_SAMPLES);
        assert!(success.final_loss > 0.0);
        assert!(success.final_accuracy > 0.0 && success.final_accuracy <= 1.0);
    }

    #[tokio::test]
    async fn test_stats_reflect_the_curated_set() {
        let (curator, manager) = manager_on_memory();

        for n in 0..4 {
            curator.maybe_add(&record(n, "Organic")).await.unwrap();
        }

        let stats = manager.stats().await.unwrap();
        assert_eq!(stats.total_samples, 4);
        assert_eq!(stats.category_counts.get("Organic"), Some(&4));
        assert!(!stats.model_ready);
    }

    #[tokio::test]
    async fn test_needs_retraining_reads_the_curated_set() {
        let (curator, manager) = manager_on_memory();

        let assessment = manager.needs_retraining().await.unwrap();
        assert!(!assessment.needs_retraining);

        // Heavily skewed set: imbalance triggers before volume does
        for n in 0..10 {
            curator.maybe_add(&record(n, "Plastic")).await.unwrap();
        }
        for n in 10..12 {
            curator.maybe_add(&record(n, "Glass")).await.unwrap();
        }

        let assessment = manager.needs_retraining().await.unwrap();
        assert!(assessment.is_imbalanced);
        assert!(!assessment.has_enough_new_samples);
        assert!(assessment.needs_retraining);
    }

    #[test]
    fn test_schedule_is_advisory() {
        let store = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
        let manager = TrainingManager::new(
            Arc::new(SampleCurator::new(store)),
            Arc::new(SimulatedEngine::new()),
        );

        let schedule = manager.schedule_retraining(Duration::from_secs(86_400));
        assert!(schedule.next_training > Utc::now());
        assert_eq!(schedule.interval, Duration::from_secs(86_400));
    }
}

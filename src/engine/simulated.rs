//! Simulated classification engine
//!
//! Stands in for the on-device neural network: produces plausible
//! probability vectors for inference and a shrinking loss curve for
//! training. The degraded mode reproduces the production fallback path,
//! where a failed inference yields a uniformly random category with low
//! confidence — downstream code must tolerate both.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, info};

use crate::config::{
    CATEGORIES, TRAINING_BATCH_SIZE, TRAINING_EPOCHS, TRAINING_VALIDATION_SPLIT,
};
use crate::training::TrainingSampleSet;

use super::{Classification, ClassificationEngine, EngineError, TrainingReport};

/// In-process stand-in for the image model
pub struct SimulatedEngine {
    categories: Vec<String>,
    ready: AtomicBool,
    degraded: bool,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self {
            categories: CATEGORIES.iter().map(|c| c.to_string()).collect(),
            ready: AtomicBool::new(false),
            degraded: false,
        }
    }

    /// An engine stuck on its fallback path: every classification is a
    /// random category with confidence in [0.3, 0.7).
    pub fn degraded() -> Self {
        Self {
            degraded: true,
            ..Self::new()
        }
    }

    fn fallback_classification(&self) -> Classification {
        let mut rng = rand::rng();
        let index = rng.random_range(0..self.categories.len());
        Classification {
            category: self.categories[index].clone(),
            confidence: rng.random_range(0.3..0.7),
            secondary_category: None,
            secondary_confidence: None,
            all_probabilities: self.categories.iter().map(|_| rng.random()).collect(),
        }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassificationEngine for SimulatedEngine {
    async fn initialize(&self) -> Result<(), EngineError> {
        if self.ready.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Simulated classification engine initialized");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn classify(&self, image_ref: &str) -> Result<Classification, EngineError> {
        if !self.is_ready() {
            self.initialize().await?;
        }

        if self.degraded {
            debug!("Degraded inference for {}", image_ref);
            return Ok(self.fallback_classification());
        }

        let mut rng = rand::rng();

        // Raw scores with one class favored, the way a trained softmax
        // head behaves on an in-distribution image.
        let favored = rng.random_range(0..self.categories.len());
        let mut probabilities: Vec<f64> = (0..self.categories.len())
            .map(|i| {
                let noise: f64 = rng.random_range(0.05..0.3);
                if i == favored {
                    noise + rng.random_range(0.8..2.5)
                } else {
                    noise
                }
            })
            .collect();
        let total: f64 = probabilities.iter().sum();
        for p in &mut probabilities {
            *p /= total;
        }

        let mut indices: Vec<usize> = (0..probabilities.len()).collect();
        indices.sort_by(|&a, &b| {
            probabilities[b]
                .partial_cmp(&probabilities[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let top = indices[0];
        let second = indices[1];

        debug!(
            "Classified {} as {} ({:.3})",
            image_ref, self.categories[top], probabilities[top]
        );

        Ok(Classification {
            category: self.categories[top].clone(),
            confidence: probabilities[top],
            secondary_category: Some(self.categories[second].clone()),
            secondary_confidence: Some(probabilities[second]),
            all_probabilities: probabilities,
        })
    }

    async fn train(&self, samples: &TrainingSampleSet) -> Result<TrainingReport, EngineError> {
        if !self.is_ready() {
            self.initialize().await?;
        }
        if samples.is_empty() {
            return Err(EngineError::Training("empty sample set".to_string()));
        }

        let validation_samples = (samples.len() as f64 * TRAINING_VALIDATION_SPLIT) as usize;
        info!(
            "Simulated training: {} samples ({} held out), batch size {}",
            samples.len(),
            validation_samples,
            TRAINING_BATCH_SIZE
        );

        let mut rng = rand::rng();
        let mut loss: f64 = rng.random_range(1.2..1.8);
        let mut accuracy: f64 = rng.random_range(0.3..0.45);

        for epoch in 0..TRAINING_EPOCHS {
            loss *= rng.random_range(0.75..0.92);
            accuracy = (accuracy + rng.random_range(0.03..0.08)).min(0.98);
            debug!(
                "Epoch {}: loss = {:.4}, accuracy = {:.4}",
                epoch + 1,
                loss,
                accuracy
            );
        }

        info!(
            "Simulated training complete: loss = {:.4}, accuracy = {:.4}",
            loss, accuracy
        );
        Ok(TrainingReport {
            final_loss: loss,
            final_accuracy: accuracy,
        })
    }

    fn categories(&self) -> &[String] {
        &self.categories
    }
}

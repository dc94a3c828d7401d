//! Classification engine seam
//!
//! The image model is an external collaborator: the data lifecycle treats
//! it as an opaque function producing a category and a confidence score in
//! [0, 1]. The trait keeps the model behind an explicit service object so
//! multiple instances and test doubles can coexist; readiness is
//! per-instance state, never a process-wide flag.

pub mod simulated;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::training::TrainingSampleSet;

pub use simulated::SimulatedEngine;

/// Raw verdict returned by the engine for one image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub category: String,
    pub confidence: f64,
    /// Runner-up category, when one can be produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_confidence: Option<f64>,
    /// Probability per category, in the engine's output order
    pub all_probabilities: Vec<f64>,
}

/// Outcome of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub final_loss: f64,
    pub final_accuracy: f64,
}

/// Error raised by the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is not initialized")]
    NotInitialized,
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("training failed: {0}")]
    Training(String),
}

/// The on-device image model, consumed as a black box
#[async_trait]
pub trait ClassificationEngine: Send + Sync {
    /// Prepare the model for inference. Idempotent; implementations
    /// lazily call this from `classify` and `train` when needed.
    async fn initialize(&self) -> Result<(), EngineError>;

    /// Whether the model is ready for inference
    fn is_ready(&self) -> bool;

    /// Classify one image
    async fn classify(&self, image_ref: &str) -> Result<Classification, EngineError>;

    /// Run one incremental training pass over the curated samples
    async fn train(&self, samples: &TrainingSampleSet) -> Result<TrainingReport, EngineError>;

    /// Categories the model predicts, in output order
    fn categories(&self) -> &[String];
}

//! Adaptive retraining controller
//!
//! Owns the curated training set and the decision of when the model should
//! be retrained:
//! - confidence-gated, capacity-bounded sample curation (paired arrays)
//! - a pure retraining assessment from sample volume and class balance
//! - orchestration of training runs against the engine

pub mod curator;
pub mod evaluator;
pub mod manager;

pub use curator::{SampleCurator, TrainingSampleSet};
pub use evaluator::{assess_retraining, RetrainingAssessment};
pub use manager::{
    RetrainingSchedule, TrainingError, TrainingManager, TrainingPhase, TrainingStats,
    TrainingSuccess,
};

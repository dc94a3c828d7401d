//! Eco-Sorter - on-device waste classification data lifecycle
//!
//! The crate persists classification outcomes, curates a bounded sample
//! set for incremental model improvement, decides when retraining is
//! warranted, and aggregates history into a points leaderboard:
//! - capped classification history with category filtering
//! - confidence-gated training sample curation (paired arrays)
//! - retraining trigger from sample volume and class balance
//! - per-user points and a persisted leaderboard
//!
//! The image model itself is an external collaborator behind the
//! [`engine::ClassificationEngine`] trait; a simulated implementation is
//! bundled for development and tests.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use eco_sorter::{
//!     ClassificationPipeline, HistoryStore, MemoryStore, SampleCurator,
//!     SimulatedEngine, SimulatedUploader,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let history = Arc::new(HistoryStore::new(store.clone()));
//!     let curator = Arc::new(SampleCurator::new(store.clone()));
//!     let pipeline = ClassificationPipeline::new(
//!         Arc::new(SimulatedEngine::new()),
//!         history,
//!         curator,
//!         Arc::new(SimulatedUploader),
//!     );
//!     let record = pipeline.process("photo-0001.jpg").await?;
//!     println!("{} ({:.0}%)", record.category, record.confidence * 100.0);
//!     Ok(())
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod types;
pub mod config;
pub mod storage;
pub mod training; // Must come before engine since engine trains over its sample set
pub mod engine;
pub mod history;
pub mod ranking;
pub mod sync;
pub mod pipeline;
pub mod cli;

// Re-export commonly used types for convenience
pub use config::Config;

pub use engine::{
    Classification, ClassificationEngine, EngineError, SimulatedEngine, TrainingReport,
};

pub use history::{filter_by_category, HistoryStore};

pub use pipeline::ClassificationPipeline;

pub use ranking::{compute_points, compute_stats, LeaderboardEntry, RankingService};

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

pub use sync::{sync_history, HttpUploader, SimulatedUploader, SyncError, TrainingUploader};

pub use training::{
    assess_retraining, RetrainingAssessment, SampleCurator, TrainingError, TrainingManager,
    TrainingPhase, TrainingSampleSet, TrainingStats,
};

pub use types::{ClassificationRecord, StorageStats, UserProfile, UserStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

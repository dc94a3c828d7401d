//! Shared types used across modules
//!
//! This module contains types that are used by multiple modules
//! to avoid circular dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted outcome of classifying a waste item.
///
/// Immutable once created; records leave the history only by capacity
/// eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRecord {
    /// Unique record ID
    pub id: String,
    /// Reference to the photographed item (path or URI)
    pub image_ref: String,
    /// Predicted waste category
    pub category: String,
    /// Model confidence in [0, 1]
    pub confidence: f64,
    /// Runner-up category, when the engine produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_category: Option<String>,
    /// Runner-up confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_confidence: Option<f64>,
    /// Full probability vector in the engine's output order
    pub all_probabilities: Vec<f64>,
    /// When the item was classified
    pub timestamp: DateTime<Utc>,
}

/// Per-user aggregate computed from the classification history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Number of recorded classifications
    pub total_scans: u64,
    /// Classifications at or above the medium confidence threshold
    pub accurate_scans: u64,
    /// Points earned across the history
    pub points: u64,
}

/// Logged-in user identity, written by the login flow and read here
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
}

/// Storage overview for profile display
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Records currently held in the history
    pub total_classifications: usize,
    /// Samples currently held in the curated training set
    pub training_data_size: usize,
    /// Distinct categories seen in the history, first-seen order
    pub categories: Vec<String>,
}

//! Retraining decision
//!
//! Pure function over curated-sample statistics: no side effects, no I/O.
//! Callers get the boolean reasons and the category counts back so the
//! rationale can be logged or displayed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{RETRAINING_IMBALANCE_RATIO, RETRAINING_NEW_SAMPLES_THRESHOLD};

use super::curator::TrainingSampleSet;

/// Whether (and why) the model should be retrained
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrainingAssessment {
    pub needs_retraining: bool,
    /// Sample volume reached the retraining threshold
    pub has_enough_new_samples: bool,
    /// Most frequent label outnumbers the least frequent beyond the
    /// imbalance ratio
    pub is_imbalanced: bool,
    pub category_counts: HashMap<String, usize>,
}

/// Decide whether the curated set warrants retraining.
///
/// The volume and balance checks are independent; either one suffices. A
/// set with fewer than two distinct labels can never be imbalanced, and an
/// empty set assesses as all-false.
pub fn assess_retraining(samples: &TrainingSampleSet) -> RetrainingAssessment {
    let category_counts = samples.category_counts();

    let has_enough_new_samples = samples.len() >= RETRAINING_NEW_SAMPLES_THRESHOLD;

    let is_imbalanced = if category_counts.len() > 1 {
        let max = category_counts.values().copied().max().unwrap_or(0);
        let min = category_counts.values().copied().min().unwrap_or(0);
        max > min * RETRAINING_IMBALANCE_RATIO
    } else {
        false
    };

    RetrainingAssessment {
        needs_retraining: has_enough_new_samples || is_imbalanced,
        has_enough_new_samples,
        is_imbalanced,
        category_counts,
    }
}

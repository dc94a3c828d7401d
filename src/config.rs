//! Configuration management
//!
//! Two layers: the fixed lifecycle tuning constants, which match the
//! deployed model and are not runtime-tunable, and a small user-editable
//! `Config` read from `config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Confidence thresholds

/// Minimum confidence for a classification to enter the training set
pub const CONFIDENCE_THRESHOLD_HIGH: f64 = 0.8;
/// Minimum confidence for a classification to count as accurate
pub const CONFIDENCE_THRESHOLD_MEDIUM: f64 = 0.7;
/// Below this, the image is offered to the remote trainer
pub const CONFIDENCE_THRESHOLD_LOW: f64 = 0.7;

// Storage limits

/// Maximum records kept in the classification history
pub const MAX_HISTORY_ITEMS: usize = 100;
/// Maximum samples kept in the curated training set
pub const MAX_TRAINING_SAMPLES: usize = 500;

// Training parameters

/// Minimum curated samples before a training run is allowed
pub const MIN_TRAINING_SAMPLES: usize = 10;
pub const TRAINING_EPOCHS: usize = 10;
pub const TRAINING_BATCH_SIZE: usize = 32;
pub const TRAINING_VALIDATION_SPLIT: f64 = 0.2;

// Points system

/// Awarded for every recorded scan
pub const POINTS_BASE: u64 = 10;
/// Bonus at confidence >= 0.9
pub const POINTS_HIGH_CONFIDENCE: u64 = 20;
/// Bonus at confidence >= the medium threshold
pub const POINTS_MEDIUM_CONFIDENCE: u64 = 10;

// Retraining thresholds

/// Curated samples that alone warrant retraining
pub const RETRAINING_NEW_SAMPLES_THRESHOLD: usize = 50;
/// Max/min category count ratio beyond which the set is imbalanced
pub const RETRAINING_IMBALANCE_RATIO: usize = 3;

/// Waste categories the deployed model predicts, in output order
pub const CATEGORIES: [&str; 6] = ["Plastic", "Paper", "Metal", "Glass", "Organic", "Other"];

/// User-editable configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the persisted documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Remote endpoint for supplementary training uploads; the simulated
    /// uploader is used when unset
    #[serde(default)]
    pub upload_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            upload_endpoint: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "eco-sorter", "eco-sorter")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "eco-sorter", "eco-sorter")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

impl Config {
    /// Load configuration from file, writing the defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let parent = config_path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

//! CLI interface for eco-sorter

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::engine::{ClassificationEngine, SimulatedEngine};
use crate::history::{filter_by_category, HistoryStore};
use crate::pipeline::ClassificationPipeline;
use crate::ranking::RankingService;
use crate::storage::{FileStore, KeyValueStore};
use crate::sync::{sync_history, HttpUploader, SimulatedUploader, TrainingUploader};
use crate::training::{SampleCurator, TrainingError, TrainingManager, TrainingPhase};

#[derive(Parser)]
#[command(name = "eco-sorter")]
#[command(about = "On-device waste classification data lifecycle", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an image and record the outcome
    Scan {
        /// Path or URI of the item photo
        image_ref: String,
    },
    /// Show the classification history, most recent first
    History {
        /// Only show records of this category
        #[arg(short, long)]
        category: Option<String>,
        /// Maximum records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show stats for the logged-in user
    Stats,
    /// Show the points leaderboard
    Rankings,
    /// Log in as a user (attributes stats and leaderboard entries)
    Login {
        username: String,
    },
    /// Training data and retraining controls
    Training {
        #[command(subcommand)]
        command: TrainingCommands,
    },
    /// Push the local history to cloud storage
    Sync,
    /// Delete all locally stored classification data
    Reset,
}

#[derive(Subcommand)]
enum TrainingCommands {
    /// Show curated sample statistics
    Status,
    /// Run one training cycle over the curated samples
    Start,
    /// Check whether retraining is warranted
    Check,
}

/// The wired-up service graph backing every subcommand
struct Services {
    history: Arc<HistoryStore>,
    pipeline: ClassificationPipeline,
    ranking: RankingService,
    training: TrainingManager,
}

async fn build_services(config: &Config) -> Result<Services> {
    let store: Arc<dyn KeyValueStore> =
        Arc::new(FileStore::new(config.data_dir.clone()).await?);
    let history = Arc::new(HistoryStore::new(store.clone()));
    let curator = Arc::new(SampleCurator::new(store.clone()));
    let engine: Arc<dyn ClassificationEngine> = Arc::new(SimulatedEngine::new());
    let uploader: Arc<dyn TrainingUploader> = match &config.upload_endpoint {
        Some(endpoint) => Arc::new(HttpUploader::new(endpoint.clone())),
        None => Arc::new(SimulatedUploader),
    };

    Ok(Services {
        history: history.clone(),
        pipeline: ClassificationPipeline::new(
            engine.clone(),
            history.clone(),
            curator.clone(),
            uploader,
        ),
        ranking: RankingService::new(store, history),
        training: TrainingManager::new(curator, engine),
    })
}

/// Parse arguments and run the selected subcommand
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let services = build_services(&config).await?;

    match cli.command {
        Commands::Scan { image_ref } => {
            let record = services.pipeline.process(&image_ref).await?;
            println!(
                "{}  ({:.0}% confidence)",
                record.category,
                record.confidence * 100.0
            );
            if let (Some(category), Some(confidence)) =
                (&record.secondary_category, record.secondary_confidence)
            {
                println!("Could also be: {} ({:.0}%)", category, confidence * 100.0);
            }
        }

        Commands::History { category, limit } => {
            let records = services.history.list().await?;
            let shown: Vec<_> = match &category {
                Some(category) => filter_by_category(&records, category),
                None => records.iter().collect(),
            };

            if shown.is_empty() {
                println!("No classifications recorded.");
            }
            for record in shown.iter().take(limit) {
                println!(
                    "{}  {:<8}  {:.2}  {}",
                    record.timestamp.format("%Y-%m-%d %H:%M"),
                    record.category,
                    record.confidence,
                    record.image_ref
                );
            }
        }

        Commands::Stats => {
            match services.ranking.current_user().await? {
                Some(profile) => println!("Stats for {}:", profile.username),
                None => println!("No user logged in; showing zeroed stats."),
            }
            let stats = services.ranking.user_stats().await?;
            println!("  Total scans:    {}", stats.total_scans);
            println!("  Accurate scans: {}", stats.accurate_scans);
            println!("  Points:         {}", stats.points);
        }

        Commands::Rankings => {
            let rankings = services.ranking.list_rankings().await?;
            for (position, entry) in rankings.iter().enumerate() {
                println!(
                    "{:>3}. {:<16} {:>6} pts  ({} scans)",
                    position + 1,
                    entry.username,
                    entry.points,
                    entry.total_scans
                );
            }
        }

        Commands::Login { username } => {
            services.ranking.set_current_user(&username).await?;
            println!("Logged in as {username}.");
        }

        Commands::Training { command } => match command {
            TrainingCommands::Status => {
                let stats = services.training.stats().await?;
                println!("Curated samples: {}", stats.total_samples);
                println!(
                    "Model ready:     {}",
                    if stats.model_ready { "yes" } else { "no" }
                );
                let mut counts: Vec<_> = stats.category_counts.iter().collect();
                counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                for (category, count) in counts {
                    println!("  {category:<8} {count}");
                }
            }
            TrainingCommands::Start => {
                let outcome = services
                    .training
                    .start_training(|phase| match phase {
                        TrainingPhase::Preparing => println!("Preparing training data..."),
                        TrainingPhase::Training => println!("Training model..."),
                        TrainingPhase::Complete => println!("Training completed."),
                    })
                    .await;
                match outcome {
                    Ok(success) => println!(
                        "{} samples, final loss {:.4}, final accuracy {:.4}",
                        success.samples_count, success.final_loss, success.final_accuracy
                    ),
                    Err(TrainingError::NotEnoughSamples {
                        available,
                        required,
                    }) => println!(
                        "Not enough training data: {available} of {required} required samples."
                    ),
                    Err(e) => return Err(e.into()),
                }
            }
            TrainingCommands::Check => {
                let assessment = services.training.needs_retraining().await?;
                println!(
                    "Needs retraining: {}",
                    if assessment.needs_retraining { "yes" } else { "no" }
                );
                println!("  enough new samples: {}", assessment.has_enough_new_samples);
                println!("  imbalanced classes: {}", assessment.is_imbalanced);
                let mut counts: Vec<_> = assessment.category_counts.iter().collect();
                counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                for (category, count) in counts {
                    println!("  {category:<8} {count}");
                }
            }
        },

        Commands::Sync => {
            let report = sync_history(&services.history).await?;
            println!("Synced {} history items.", report.synced);
        }

        Commands::Reset => {
            services.pipeline.clear_all().await?;
            println!("All classification data cleared.");
        }
    }

    Ok(())
}

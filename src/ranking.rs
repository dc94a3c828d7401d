//! Points and leaderboard
//!
//! Converts the classification history into a points score and merges
//! per-user aggregates into the persisted leaderboard. Points are always
//! recomputed from the full history, never stored as a running delta.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{
    CONFIDENCE_THRESHOLD_MEDIUM, POINTS_BASE, POINTS_HIGH_CONFIDENCE, POINTS_MEDIUM_CONFIDENCE,
};
use crate::history::HistoryStore;
use crate::storage::{keys, KeyValueStore, StorageError};
use crate::types::{ClassificationRecord, UserProfile, UserStats};

/// One per-user leaderboard entry, unique by username
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub total_scans: u64,
    pub accurate_scans: u64,
    pub points: u64,
    /// Set when the entry is first created, never touched afterwards
    pub joined_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Points earned across a classification history.
///
/// Every scan earns the base award; confident scans earn a bonus on top,
/// with the 0.9 tier taking precedence over the medium tier.
pub fn compute_points(history: &[ClassificationRecord]) -> u64 {
    let mut points = 0;
    for record in history {
        points += POINTS_BASE;
        if record.confidence >= 0.9 {
            points += POINTS_HIGH_CONFIDENCE;
        } else if record.confidence >= CONFIDENCE_THRESHOLD_MEDIUM {
            points += POINTS_MEDIUM_CONFIDENCE;
        }
    }
    points
}

/// Aggregate stats over a classification history. Pure.
pub fn compute_stats(history: &[ClassificationRecord]) -> UserStats {
    UserStats {
        total_scans: history.len() as u64,
        accurate_scans: history
            .iter()
            .filter(|r| r.confidence >= CONFIDENCE_THRESHOLD_MEDIUM)
            .count() as u64,
        points: compute_points(history),
    }
}

/// Persisted leaderboard over the classification history
pub struct RankingService {
    store: Arc<dyn KeyValueStore>,
    history: Arc<HistoryStore>,
}

impl RankingService {
    pub fn new(store: Arc<dyn KeyValueStore>, history: Arc<HistoryStore>) -> Self {
        Self { store, history }
    }

    /// Aggregate stats for the logged-in user, refreshed into the
    /// leaderboard. Without a logged-in user this returns zeroed stats and
    /// leaves the leaderboard untouched.
    pub async fn user_stats(&self) -> Result<UserStats, StorageError> {
        let Some(profile) = self.current_user().await? else {
            return Ok(UserStats::default());
        };

        let history = self.history.list().await?;
        let stats = compute_stats(&history);
        self.upsert_entry(&profile.username, &stats).await?;
        Ok(stats)
    }

    /// Logged-in user, if any. An unreadable profile reads as logged out.
    pub async fn current_user(&self) -> Result<Option<UserProfile>, StorageError> {
        let Some(payload) = self.store.get(keys::USER).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&payload) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!("Discarding unreadable user profile: {}", e);
                Ok(None)
            }
        }
    }

    /// Record the logged-in user
    pub async fn set_current_user(&self, username: &str) -> Result<(), StorageError> {
        let profile = UserProfile {
            username: username.to_string(),
        };
        let payload = serde_json::to_string_pretty(&profile)?;
        self.store.set(keys::USER, &payload).await
    }

    /// Merge stats into the user's leaderboard entry, creating it on first
    /// sight. `joined_date` is preserved on update; `last_updated` is
    /// refreshed. The rankings key's write lock is held across the merge.
    pub async fn upsert_entry(&self, username: &str, stats: &UserStats) -> Result<(), StorageError> {
        let _guard = self.store.lock_key(keys::USER_RANKINGS).await;

        let mut rankings = self.load_rankings().await?;
        let now = Utc::now();

        match rankings.iter_mut().find(|e| e.username == username) {
            Some(entry) => {
                entry.total_scans = stats.total_scans;
                entry.accurate_scans = stats.accurate_scans;
                entry.points = stats.points;
                entry.last_updated = now;
            }
            None => rankings.push(LeaderboardEntry {
                username: username.to_string(),
                total_scans: stats.total_scans,
                accurate_scans: stats.accurate_scans,
                points: stats.points,
                joined_date: now,
                last_updated: now,
            }),
        }

        sort_rankings(&mut rankings);
        self.persist_rankings(&rankings).await
    }

    /// Leaderboard entries sorted by points descending. An empty store is
    /// seeded once with the demonstration entries so a fresh install has
    /// something to show.
    pub async fn list_rankings(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let _guard = self.store.lock_key(keys::USER_RANKINGS).await;

        let mut rankings = self.load_rankings().await?;
        if rankings.is_empty() {
            rankings = demo_rankings();
            self.persist_rankings(&rankings).await?;
            info!("Seeded leaderboard with {} demo entries", rankings.len());
        }

        sort_rankings(&mut rankings);
        Ok(rankings)
    }

    /// Add bonus points to a user's entry. Returns `Ok(false)` when the
    /// username has no entry. `reason` is logged for auditability but not
    /// persisted.
    pub async fn award_bonus(
        &self,
        username: &str,
        points: u64,
        reason: &str,
    ) -> Result<bool, StorageError> {
        let _guard = self.store.lock_key(keys::USER_RANKINGS).await;

        let mut rankings = self.load_rankings().await?;
        let Some(entry) = rankings.iter_mut().find(|e| e.username == username) else {
            return Ok(false);
        };

        entry.points += points;
        entry.last_updated = Utc::now();

        sort_rankings(&mut rankings);
        self.persist_rankings(&rankings).await?;
        info!("Awarded {} bonus points to {} for: {}", points, username, reason);
        Ok(true)
    }

    async fn load_rankings(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let Some(payload) = self.store.get(keys::USER_RANKINGS).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&payload) {
            Ok(rankings) => Ok(rankings),
            Err(e) => {
                warn!("Discarding unreadable leaderboard: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn persist_rankings(&self, rankings: &[LeaderboardEntry]) -> Result<(), StorageError> {
        let payload = serde_json::to_string_pretty(rankings)?;
        self.store.set(keys::USER_RANKINGS, &payload).await
    }
}

/// Points descending; equal points order by username so ranking output is
/// deterministic.
fn sort_rankings(rankings: &mut [LeaderboardEntry]) {
    rankings.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.username.cmp(&b.username))
    });
}

/// First-run leaderboard content; demonstration data, not a production
/// source.
fn demo_rankings() -> Vec<LeaderboardEntry> {
    let now = Utc::now();
    let entry = |username: &str, total: u64, accurate: u64, points: u64, y: i32, m: u32, d: u32| {
        LeaderboardEntry {
            username: username.to_string(),
            total_scans: total,
            accurate_scans: accurate,
            points,
            joined_date: Utc
                .with_ymd_and_hms(y, m, d, 0, 0, 0)
                .single()
                .unwrap_or(now),
            last_updated: now,
        }
    };

    vec![
        entry("EcoWarrior", 156, 145, 3580, 2024, 1, 15),
        entry("GreenHero", 132, 120, 2980, 2024, 2, 20),
        entry("RecycleKing", 98, 92, 2240, 2024, 3, 10),
        entry("EarthLover", 87, 80, 1970, 2024, 3, 25),
        entry("WasteSorter", 65, 58, 1450, 2024, 4, 5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn record(confidence: f64) -> ClassificationRecord {
        ClassificationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            image_ref: "photo.jpg".to_string(),
            category: "Plastic".to_string(),
            confidence,
            secondary_category: None,
            secondary_confidence: None,
            all_probabilities: vec![confidence, 1.0 - confidence],
            timestamp: Utc::now(),
        }
    }

    fn service_on_memory() -> (Arc<HistoryStore>, RankingService) {
        let store = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
        let history = Arc::new(HistoryStore::new(store.clone()));
        let service = RankingService::new(store, history.clone());
        (history, service)
    }

    #[test]
    fn test_points_are_deterministic() {
        let history = vec![record(0.95), record(0.75), record(0.5)];
        // (10+20) + (10+10) + 10
        assert_eq!(compute_points(&history), 60);
    }

    #[test]
    fn test_stats_count_accurate_scans() {
        let history = vec![record(0.95), record(0.75), record(0.5)];
        let stats = compute_stats(&history);
        assert_eq!(stats.total_scans, 3);
        assert_eq!(stats.accurate_scans, 2);
        assert_eq!(stats.points, 60);
    }

    #[tokio::test]
    async fn test_no_logged_in_user_means_zero_stats() {
        let (history, service) = service_on_memory();
        history.append(&record(0.95)).await.unwrap();

        let stats = service.user_stats().await.unwrap();
        assert_eq!(stats, UserStats::default());

        // The leaderboard was not touched: a later listing only shows the
        // demo seed, with no entry for any real user.
        let rankings = service.list_rankings().await.unwrap();
        assert_eq!(rankings.len(), 5);
    }

    #[tokio::test]
    async fn test_user_stats_upsert_into_leaderboard() {
        let (history, service) = service_on_memory();
        service.set_current_user("alice").await.unwrap();

        history.append(&record(0.95)).await.unwrap();
        history.append(&record(0.75)).await.unwrap();

        let stats = service.user_stats().await.unwrap();
        assert_eq!(stats.total_scans, 2);
        assert_eq!(stats.points, 50);

        let rankings = service.list_rankings().await.unwrap();
        let alice = rankings.iter().find(|e| e.username == "alice").unwrap();
        assert_eq!(alice.points, 50);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (_history, service) = service_on_memory();
        let stats = UserStats {
            total_scans: 7,
            accurate_scans: 5,
            points: 120,
        };

        service.upsert_entry("alice", &stats).await.unwrap();
        let before = service.list_rankings().await.unwrap();
        let first = before.iter().find(|e| e.username == "alice").unwrap().clone();

        service.upsert_entry("alice", &stats).await.unwrap();
        let after = service.list_rankings().await.unwrap();

        let entries: Vec<_> = after.iter().filter(|e| e.username == "alice").collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].points, 120);
        assert_eq!(entries[0].total_scans, 7);
        assert_eq!(entries[0].joined_date, first.joined_date);
        assert!(entries[0].last_updated >= first.last_updated);
    }

    #[tokio::test]
    async fn test_rankings_sorted_with_username_tie_break() {
        let (_history, service) = service_on_memory();
        let stats = |points| UserStats {
            total_scans: 1,
            accurate_scans: 1,
            points,
        };

        service.upsert_entry("zoe", &stats(4000)).await.unwrap();
        service.upsert_entry("bob", &stats(4000)).await.unwrap();
        service.upsert_entry("carol", &stats(5000)).await.unwrap();

        let rankings = service.list_rankings().await.unwrap();
        let names: Vec<&str> = rankings.iter().map(|e| e.username.as_str()).collect();
        // carol leads; bob/zoe tie at 4000 and order alphabetically
        assert_eq!(&names[..3], &["carol", "bob", "zoe"]);

        let mut previous = u64::MAX;
        for entry in &rankings {
            assert!(entry.points <= previous);
            previous = entry.points;
        }
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_exactly_once() {
        let (_history, service) = service_on_memory();

        let first = service.list_rankings().await.unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(first[0].username, "EcoWarrior");
        assert_eq!(first[0].points, 3580);

        let second = service.list_rankings().await.unwrap();
        assert_eq!(second.len(), 5);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.username, b.username);
            assert_eq!(a.last_updated, b.last_updated);
        }
    }

    #[tokio::test]
    async fn test_award_bonus() {
        let (_history, service) = service_on_memory();

        // Unknown user: reported, not an error
        let awarded = service.award_bonus("nobody", 50, "streak").await.unwrap();
        assert!(!awarded);

        service
            .upsert_entry(
                "alice",
                &UserStats {
                    total_scans: 1,
                    accurate_scans: 1,
                    points: 30,
                },
            )
            .await
            .unwrap();

        let awarded = service.award_bonus("alice", 50, "weekly streak").await.unwrap();
        assert!(awarded);

        let rankings = service.list_rankings().await.unwrap();
        let alice = rankings.iter().find(|e| e.username == "alice").unwrap();
        assert_eq!(alice.points, 80);
    }
}

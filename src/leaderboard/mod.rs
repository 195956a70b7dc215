mod http;

use crate::types::User;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

pub use http::HttpLeaderboard;

/// Result type for leaderboard operations
pub type LeaderboardResult<T> = Result<T, LeaderboardError>;

/// Errors that can occur talking to the leaderboard
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("Leaderboard request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Leaderboard returned status {0}")]
    Status(u16),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// A score handed to the leaderboard at round end
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreSubmission {
    pub user_id: String,
    pub display_name: String,
    pub score: u32,
    pub elapsed_seconds: u32,
    /// Submission timestamp (ISO8601)
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    /// Seconds the round took
    pub time: u32,
    pub date: String,
}

/// What a presentation layer shows for the top list
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardView {
    Entries(Vec<LeaderboardEntry>),
    Unavailable(String),
}

/// Remote key-value store for scores
#[async_trait]
pub trait Leaderboard: Send + Sync {
    async fn submit_score(&self, submission: ScoreSubmission) -> LeaderboardResult<()>;

    /// Top entries, highest score first
    async fn fetch_top_entries(&self, limit: usize) -> LeaderboardResult<Vec<LeaderboardEntry>>;
}

/// Order entries by score descending; ties keep the faster time first
pub fn sort_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.time.cmp(&b.time)));
}

/// Submit a score without waiting for the result.
///
/// Skipped (returns None) when nobody is signed in or the user opted out.
/// Failures are logged and otherwise ignored.
pub fn submit_in_background(
    leaderboard: Arc<dyn Leaderboard>,
    user: Option<User>,
    opt_out: bool,
    score: u32,
    elapsed_seconds: u32,
) -> Option<JoinHandle<()>> {
    if opt_out {
        tracing::info!("Leaderboard submission skipped (opted out)");
        return None;
    }
    let Some(user) = user else {
        tracing::info!("Leaderboard submission skipped (not signed in)");
        return None;
    };

    let submission = ScoreSubmission {
        user_id: user.id,
        display_name: user.display_name,
        score,
        elapsed_seconds,
        date: chrono::Utc::now().to_rfc3339(),
    };

    Some(tokio::spawn(async move {
        match leaderboard.submit_score(submission).await {
            Ok(()) => tracing::info!("Score {} submitted to leaderboard", score),
            Err(e) => tracing::warn!("Failed to submit score: {}", e),
        }
    }))
}

/// Fetch the top list, turning failures into an "unable to load" view
pub async fn fetch_or_unavailable(leaderboard: &dyn Leaderboard, limit: usize) -> LeaderboardView {
    match leaderboard.fetch_top_entries(limit).await {
        Ok(entries) => LeaderboardView::Entries(entries),
        Err(e) => {
            tracing::warn!("Failed to load leaderboard: {}", e);
            LeaderboardView::Unavailable("Unable to load leaderboard".to_string())
        }
    }
}

/// In-process leaderboard, used offline and in tests
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    entries: RwLock<Vec<LeaderboardEntry>>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Leaderboard for MemoryLeaderboard {
    async fn submit_score(&self, submission: ScoreSubmission) -> LeaderboardResult<()> {
        self.entries.write().await.push(LeaderboardEntry {
            name: submission.display_name,
            score: submission.score,
            time: submission.elapsed_seconds,
            date: submission.date,
        });
        Ok(())
    }

    async fn fetch_top_entries(&self, limit: usize) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        let mut entries = self.entries.read().await.clone();
        sort_entries(&mut entries);
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenLeaderboard;

    #[async_trait]
    impl Leaderboard for BrokenLeaderboard {
        async fn submit_score(&self, _submission: ScoreSubmission) -> LeaderboardResult<()> {
            Err(LeaderboardError::Status(503))
        }

        async fn fetch_top_entries(&self, _limit: usize) -> LeaderboardResult<Vec<LeaderboardEntry>> {
            Err(LeaderboardError::Status(503))
        }
    }

    fn user(name: &str) -> User {
        User {
            id: format!("id-{}", name),
            display_name: name.to_string(),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_memory_leaderboard_sorted_descending() {
        let board = MemoryLeaderboard::new();
        for (name, score, time) in [("a", 10, 50), ("b", 30, 90), ("c", 30, 60), ("d", 5, 10)] {
            board
                .submit_score(ScoreSubmission {
                    user_id: name.into(),
                    display_name: name.into(),
                    score,
                    elapsed_seconds: time,
                    date: "2026-01-01T00:00:00Z".into(),
                })
                .await
                .unwrap();
        }

        let top = board.fetch_top_entries(3).await.unwrap();
        let names: Vec<_> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_submit_skipped_without_user_or_on_opt_out() {
        let board = Arc::new(MemoryLeaderboard::new());
        assert!(submit_in_background(board.clone(), None, false, 10, 30).is_none());
        assert!(submit_in_background(board.clone(), Some(user("ann")), true, 10, 30).is_none());
        assert!(board.is_empty().await);
    }

    #[tokio::test]
    async fn test_submit_in_background() {
        let board = Arc::new(MemoryLeaderboard::new());
        let handle = submit_in_background(board.clone(), Some(user("ann")), false, 42, 95).unwrap();
        handle.await.unwrap();

        let top = board.fetch_top_entries(10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "ann");
        assert_eq!(top[0].score, 42);
        assert_eq!(top[0].time, 95);
    }

    #[tokio::test]
    async fn test_submit_failure_is_not_fatal() {
        let board: Arc<dyn Leaderboard> = Arc::new(BrokenLeaderboard);
        let handle = submit_in_background(board, Some(user("ann")), false, 1, 1).unwrap();
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back() {
        let view = fetch_or_unavailable(&BrokenLeaderboard, 10).await;
        assert_eq!(
            view,
            LeaderboardView::Unavailable("Unable to load leaderboard".to_string())
        );
    }
}

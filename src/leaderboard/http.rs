use super::*;
use std::time::Duration;

/// Leaderboard backed by a JSON HTTP service.
///
/// `POST {base}/scores` stores a [`ScoreSubmission`];
/// `GET {base}/scores?limit=N` returns a list of [`LeaderboardEntry`].
pub struct HttpLeaderboard {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLeaderboard {
    pub fn new(base_url: &str) -> LeaderboardResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(LeaderboardError::ConfigError(format!(
                "Leaderboard URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { base_url, client })
    }

    fn scores_url(&self) -> String {
        format!("{}/scores", self.base_url)
    }
}

#[async_trait]
impl Leaderboard for HttpLeaderboard {
    async fn submit_score(&self, submission: ScoreSubmission) -> LeaderboardResult<()> {
        let response = self
            .client
            .post(self.scores_url())
            .json(&submission)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LeaderboardError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn fetch_top_entries(&self, limit: usize) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        let response = self
            .client
            .get(self.scores_url())
            .query(&[("limit", limit)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LeaderboardError::Status(response.status().as_u16()));
        }

        let mut entries: Vec<LeaderboardEntry> = response.json().await?;
        // Don't trust the server's ordering
        sort_entries(&mut entries);
        entries.truncate(limit);
        Ok(entries)
    }
}

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// External match-scoring collaborator. Given a resume / job-description
/// pair it returns a 0-100 match score; any failure surfaces as
/// `ScoringUnavailable` and never blocks the application's pipeline state.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    async fn compute_score(&self, resume: &str, job_description: &str) -> Result<i32>;
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: i32,
}

#[derive(Clone)]
pub struct HttpScoreProvider {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpScoreProvider {
    pub fn new(api_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client for scoring service");
        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl ScoreProvider for HttpScoreProvider {
    async fn compute_score(&self, resume: &str, job_description: &str) -> Result<i32> {
        let payload = json!({
            "resume": resume,
            "job_description": job_description,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Scoring request failed: {:?}", e);
                Error::ScoringUnavailable(format!("Scoring request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(Error::ScoringUnavailable(format!(
                "Scoring service returned {}",
                response.status()
            )));
        }

        let body: ScoreResponse = response.json().await.map_err(|e| {
            Error::ScoringUnavailable(format!("Malformed scoring response: {}", e))
        })?;

        if !(0..=100).contains(&body.score) {
            return Err(Error::ScoringUnavailable(format!(
                "Scoring service returned out-of-range score {}",
                body.score
            )));
        }
        Ok(body.score)
    }
}

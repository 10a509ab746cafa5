//! HTTP client for the external challenge-solving service.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::{ChallengeSolver, SolveError};

/// Reqwest-backed solver with a bounded request timeout.
#[derive(Debug, Clone)]
pub struct HttpChallengeSolver {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChallengeSolver {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, SolveError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| SolveError::Transport(error.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ChallengeSolver for HttpChallengeSolver {
    async fn solve(&self, account_id: u64, captcha_url: &str) -> Result<(), SolveError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "account_id": account_id,
                "captcha_url": captcha_url,
            }))
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    SolveError::Timeout
                } else {
                    SolveError::Transport(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SolveError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}

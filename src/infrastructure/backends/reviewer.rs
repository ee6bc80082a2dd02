#[cfg(test)]
#[path = "reviewer_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Completion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ReviewRequest {
    code_snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ReviewResponse {
    review: String,
}

/// The code review generation service. Single POST, whole response at once.
pub struct Reviewer {
    url: String,
    timeout: String,
}

impl Default for Reviewer {
    fn default() -> Reviewer {
        return Reviewer {
            url: Config::get(ConfigKey::ModelUrl),
            timeout: Config::get(ConfigKey::HealthCheckTimeout),
        };
    }
}

impl Reviewer {
    pub fn with_url(url: String) -> Reviewer {
        return Reviewer {
            url,
            timeout: "200".to_string(),
        };
    }
}

#[async_trait]
impl Completion for Reviewer {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Model URL is not defined");
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if res.is_err() {
            tracing::error!(error = ?res.unwrap_err(), "Model service is not reachable");
            bail!("Model service is not reachable");
        }

        let status = res.unwrap().status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Model service health check failed");
            bail!("Model service health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn generate(&self, text: &str) -> Result<String> {
        let req = ReviewRequest {
            code_snippet: text.to_string(),
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/model", url = self.url))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make review request to model service"
            );
            bail!("Failed to make review request to model service");
        }

        let body = res.json::<ReviewResponse>().await?;
        tracing::debug!(chars = body.review.len(), "Review response");

        return Ok(body.review);
    }
}

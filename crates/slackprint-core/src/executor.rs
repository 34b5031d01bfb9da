//! Retrying wrapper around [`SlackApi::call`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use slackprint_config::RetryConfig;

use crate::api::{ApiResponse, Params, SlackApi};
use crate::error::{Result, WatchError};

/// How hard to try before accepting a failed response.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub sleep: Duration,
    /// Error codes that are a final answer, never retried.
    pub expected_errors: Vec<String>,
}

impl RetryPolicy {
    fn is_expected(&self, code: Option<&str>) -> bool {
        code.is_some_and(|code| self.expected_errors.iter().any(|e| e == code))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            sleep: Duration::from_secs(config.sleep_secs),
            expected_errors: config.expected_errors.clone(),
        }
    }
}

/// Issues Web API calls with bounded, fixed-interval retries.
///
/// Returns the last response whether or not it succeeded. The only error is
/// [`WatchError::Transport`], for a call that never got a response.
pub struct RemoteCallExecutor {
    client: Arc<dyn SlackApi>,
    policy: RetryPolicy,
}

impl RemoteCallExecutor {
    pub fn new(client: Arc<dyn SlackApi>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn call(&self, endpoint: &str, params: &Params) -> Result<ApiResponse> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let response = self.client.call(endpoint, params).await.map_err(|e| {
                WatchError::Transport {
                    endpoint: endpoint.to_string(),
                    message: format!("{e:#}"),
                }
            })?;

            if response.is_ok() {
                return Ok(response);
            }

            let code = response.error();
            warn!(
                "Slack {endpoint} failed (attempt {attempt}/{max_attempts}): {}",
                code.unwrap_or("unknown error")
            );

            if self.policy.is_expected(code) {
                debug!("{endpoint}: expected error, not retrying");
                return Ok(response);
            }
            if attempt >= max_attempts {
                return Ok(response);
            }

            sleep(self.policy.sleep).await;
            attempt += 1;
        }
    }
}

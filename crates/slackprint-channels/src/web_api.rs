//! Slack Web API client over reqwest.
//!
//! Methods are POSTed form-encoded to `https://slack.com/api/<method>` with
//! the bot token as bearer credential. The same token authenticates
//! `url_private` file downloads.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use slackprint_core::{ApiResponse, Params, SlackApi};

pub const SLACK_API_BASE: &str = "https://slack.com/api/";

pub struct SlackWebClient {
    http: reqwest::Client,
    token: String,
    base_url: Url,
}

impl SlackWebClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, SLACK_API_BASE)
    }

    /// Client against a different API root (must end with `/`).
    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(anyhow::anyhow!("Slack bot token (xoxb-*) not configured"));
        }
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid Slack API URL '{base_url}'"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            token,
            base_url,
        })
    }

    fn method_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint)
            .with_context(|| format!("invalid Slack API method '{endpoint}'"))
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn call(&self, endpoint: &str, params: &Params) -> Result<ApiResponse> {
        let url = self.method_url(endpoint)?;
        debug!("Slack API call {endpoint}");

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .form(&form_fields(params))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        Ok(parse_body(endpoint, status, &body))
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .timeout(Duration::from_secs(60))
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        debug!("Fetched {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Flatten params into form fields. Strings are sent as-is, anything else
/// as its JSON text.
fn form_fields(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Decode a method response. A body that is not JSON (proxy error pages,
/// bare 5xx) becomes an unsuccessful response so the executor can retry it.
fn parse_body(endpoint: &str, status: StatusCode, body: &str) -> ApiResponse {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ApiResponse::new(value),
        Err(_) => {
            warn!("Slack {endpoint} returned a non-JSON body ({status})");
            let error = if status.is_success() {
                "invalid_response".to_string()
            } else {
                format!("http_{}", status.as_u16())
            };
            ApiResponse::new(json!({"ok": false, "error": error}))
        }
    }
}

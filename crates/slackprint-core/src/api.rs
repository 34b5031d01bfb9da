//! Remote API seam: the Slack Web API client the core talks to.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Named arguments for a Web API method.
pub type Params = Map<String, Value>;

/// A decoded Web API response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    body: Value,
}

impl ApiResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Whether the call succeeded.
    ///
    /// A missing `ok` field counts as success so that endpoints with a
    /// different response shape are not retried. A present but non-boolean
    /// `ok` counts as failure.
    pub fn is_ok(&self) -> bool {
        match self.body.get("ok") {
            None => true,
            Some(ok) => ok.as_bool().unwrap_or(false),
        }
    }

    /// Slack error code, e.g. `"channel_not_found"`.
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Client for the Slack Web API.
///
/// `Err` from either method means the request never produced a response
/// (connection refused, DNS failure, ...). An unsuccessful but well-formed
/// response must be returned as `Ok`.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Invoke a Web API method such as `conversations.info`.
    async fn call(&self, endpoint: &str, params: &Params) -> Result<ApiResponse>;

    /// Download a private file, authenticated with the client's bearer token.
    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>>;
}

//! Stand-in Slack client for replaying events without a bot token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use slackprint_core::{ApiResponse, Params, SlackApi};

/// Every API call fails with `not_authed`; file URLs are read from the
/// local filesystem (`file://` prefix optional).
pub struct OfflineApi;

#[async_trait]
impl SlackApi for OfflineApi {
    async fn call(&self, _endpoint: &str, _params: &Params) -> Result<ApiResponse> {
        Ok(ApiResponse::new(json!({"ok": false, "error": "not_authed"})))
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read '{path}'"))
    }
}

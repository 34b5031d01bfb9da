//! Channel id to name resolution, memoized for the life of the process.
//!
//! The cache never expires. A channel renamed mid-run keeps its old name
//! until restart, and memory grows with the number of distinct channel ids
//! seen, which is tens in practice.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ApiResponse, Params};
use crate::error::Result;
use crate::executor::RemoteCallExecutor;

pub const CHANNEL_INFO_ENDPOINT: &str = "conversations.info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

impl ChannelInfo {
    /// Extract `channel.id` / `channel.name` from a `conversations.info` response.
    pub fn from_response(requested_id: &str, response: &ApiResponse) -> Option<Self> {
        let channel = response.body().get("channel")?;
        let name = channel.get("name").and_then(Value::as_str)?;
        let id = channel
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(requested_id);
        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
        })
    }
}

/// Outcome of a lookup. Failures are cached like successes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ChannelInfo),
    Failed { error: Option<String> },
}

impl Resolution {
    pub fn name(&self) -> Option<&str> {
        match self {
            Resolution::Found(info) => Some(&info.name),
            Resolution::Failed { .. } => None,
        }
    }

    fn from_response(requested_id: &str, response: &ApiResponse) -> Self {
        if response.is_ok() {
            if let Some(info) = ChannelInfo::from_response(requested_id, response) {
                return Resolution::Found(info);
            }
        }
        Resolution::Failed {
            error: response.error().map(String::from),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChannelResolver {
    cache: HashMap<String, Resolution>,
}

impl ChannelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `channel_id`, asking Slack only on the first request for it.
    ///
    /// A transport failure is returned as an error and not cached.
    pub async fn resolve(
        &mut self,
        executor: &RemoteCallExecutor,
        channel_id: &str,
    ) -> Result<Resolution> {
        if let Some(cached) = self.cache.get(channel_id) {
            return Ok(cached.clone());
        }

        let mut params = Params::new();
        params.insert("channel".into(), Value::String(channel_id.to_string()));
        let response = executor.call(CHANNEL_INFO_ENDPOINT, &params).await?;

        let resolution = Resolution::from_response(channel_id, &response);
        match &resolution {
            Resolution::Found(info) => info!("Resolved channel {channel_id} -> #{}", info.name),
            Resolution::Failed { error } => debug!(
                "Could not resolve channel {channel_id}: {}",
                error.as_deref().unwrap_or("no channel name in response")
            ),
        }

        self.cache
            .insert(channel_id.to_string(), resolution.clone());
        Ok(resolution)
    }

    pub fn cached(&self, channel_id: &str) -> Option<&Resolution> {
        self.cache.get(channel_id)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Forget every resolution.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

use thiserror::Error;

/// Failures surfaced by the watcher core.
///
/// Unsuccessful Slack responses are not errors: the executor hands them back
/// as an [`ApiResponse`](crate::ApiResponse). Only a call that never produced a
/// response becomes [`WatchError::Transport`].
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("transport failure calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, WatchError>;

//! Slack collaborators for the watcher: a Web API client and a Socket Mode
//! event source.

pub mod replay;
pub mod slack;
pub mod web_api;

pub use replay::read_events;
pub use slack::SlackEventSource;
pub use web_api::SlackWebClient;

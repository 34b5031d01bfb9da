//! Event filtering, channel resolution and print dispatch for slackprint.
//!
//! Events flow through [`watcher::ChannelWatcher`], which decides whether the
//! originating channel is watched (directly by name, or by resolving an opaque
//! id through [`resolver::ChannelResolver`]) and hands accepted text and images
//! to the printer sink. All Slack Web API traffic goes through
//! [`executor::RemoteCallExecutor`], which owns the retry policy.

pub mod api;
pub mod error;
pub mod event;
pub mod executor;
pub mod imaging;
pub mod resolver;
pub mod sink;
pub mod text;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use api::{ApiResponse, Params, SlackApi};
pub use error::{Result, WatchError};
pub use event::{FileRef, IncomingEvent};
pub use executor::{RemoteCallExecutor, RetryPolicy};
pub use resolver::{ChannelInfo, ChannelResolver, Resolution};
pub use sink::PrinterSink;
pub use watcher::{ChannelWatcher, Dispatch, IgnoreReason, WatchList};

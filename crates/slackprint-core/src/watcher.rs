//! The channel watcher: decides which events are of interest and prints them.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::api::SlackApi;
use crate::error::Result;
use crate::event::IncomingEvent;
use crate::executor::{RemoteCallExecutor, RetryPolicy};
use crate::imaging::ImagePipeline;
use crate::resolver::{ChannelResolver, Resolution};
use crate::sink::PrinterSink;
use crate::text::TextWriter;

/// Channel names (or raw ids) whose messages are printed.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    channels: HashSet<String>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel: impl Into<String>) {
        self.channels.insert(channel.into());
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for WatchList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            channels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why an event was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No string `channel` field.
    NoChannel,
    /// The channel resolved to a name that is not watched.
    NotWatched { channel: String, name: String },
    /// The channel id could not be resolved to a name.
    Unresolved { channel: String },
}

/// What `handle` did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Ignored(IgnoreReason),
    /// The channel is watched. `text` and `images` count only what the
    /// printer accepted; failed fetches, decodes and writes are not included.
    Printed { text: bool, images: usize },
}

enum ChannelMatch {
    /// The raw field already names a watched channel.
    Direct,
    /// The raw field is an id that resolved to a watched name.
    Resolved,
    Rejected(IgnoreReason),
}

/// Filters a single stream of events and prints the interesting ones.
///
/// Events are handled one at a time; the watch list and resolver cache are
/// owned here and need no locking.
pub struct ChannelWatcher {
    watch_list: WatchList,
    executor: RemoteCallExecutor,
    resolver: ChannelResolver,
    text: TextWriter,
    images: ImagePipeline,
}

impl ChannelWatcher {
    pub fn new(
        client: Arc<dyn SlackApi>,
        sink: Arc<dyn PrinterSink>,
        policy: RetryPolicy,
        max_image_width: u32,
    ) -> Self {
        Self {
            watch_list: WatchList::new(),
            executor: RemoteCallExecutor::new(client.clone(), policy),
            resolver: ChannelResolver::new(),
            text: TextWriter::new(sink.clone()),
            images: ImagePipeline::new(client, sink, max_image_width),
        }
    }

    pub fn watch_channel(&mut self, channel: impl Into<String>) {
        self.watch_list.insert(channel);
    }

    pub fn with_watch_list(mut self, watch_list: WatchList) -> Self {
        self.watch_list = watch_list;
        self
    }

    /// Resolver cache, e.g. to `clear` it so channels are looked up again.
    pub fn resolver_mut(&mut self) -> &mut ChannelResolver {
        &mut self.resolver
    }

    /// Filter one event and print its text and images if it is of interest.
    ///
    /// Only a transport failure while resolving the channel is an error.
    pub async fn handle(&mut self, event: &IncomingEvent) -> Result<Dispatch> {
        let Some(channel) = event.channel.as_deref() else {
            return Ok(Dispatch::Ignored(IgnoreReason::NoChannel));
        };

        match self.match_channel(channel).await? {
            ChannelMatch::Direct => debug!("Event in watched channel {channel}"),
            ChannelMatch::Resolved => debug!("Event in watched channel id {channel}"),
            ChannelMatch::Rejected(reason) => return Ok(Dispatch::Ignored(reason)),
        }

        let mut printed_text = false;
        if let Some(text) = event.text.as_deref().filter(|t| !t.is_empty()) {
            printed_text = self.text.write(text).await;
        }

        let mut images = 0;
        for file in &event.files {
            if self.images.handle_image(file).await {
                images += 1;
            }
        }

        Ok(Dispatch::Printed {
            text: printed_text,
            images,
        })
    }

    /// Direct name match first, then resolve the field as a channel id.
    async fn match_channel(&mut self, channel: &str) -> Result<ChannelMatch> {
        if self.watch_list.contains(channel) {
            return Ok(ChannelMatch::Direct);
        }

        let resolution = self.resolver.resolve(&self.executor, channel).await?;
        Ok(match resolution {
            Resolution::Found(info) if self.watch_list.contains(&info.name) => {
                ChannelMatch::Resolved
            }
            Resolution::Found(info) => ChannelMatch::Rejected(IgnoreReason::NotWatched {
                channel: channel.to_string(),
                name: info.name,
            }),
            Resolution::Failed { .. } => ChannelMatch::Rejected(IgnoreReason::Unresolved {
                channel: channel.to_string(),
            }),
        })
    }

    /// Drain `events` until every sender is dropped.
    ///
    /// A transport failure is logged and the loop moves on to the next event.
    pub async fn run(&mut self, mut events: mpsc::Receiver<IncomingEvent>) {
        info!(
            "Watching {} channel(s): {}",
            self.watch_list.len(),
            self.watch_list.iter().collect::<Vec<_>>().join(", ")
        );
        while let Some(event) = events.recv().await {
            match self.handle(&event).await {
                Ok(Dispatch::Printed { text, images }) => {
                    info!("Printed event (text: {text}, images: {images})");
                }
                Ok(Dispatch::Ignored(reason)) => debug!("Ignored event: {reason:?}"),
                Err(e) => error!("Failed to handle event: {e}"),
            }
        }
        info!("Event stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FileRef;
    use crate::testing::{png_bytes, quick_policy, MockApi, RecordingSink};
    use serde_json::json;

    fn watcher(api: &Arc<MockApi>, sink: &Arc<RecordingSink>) -> ChannelWatcher {
        let mut watcher = ChannelWatcher::new(api.clone(), sink.clone(), quick_policy(2), 512);
        watcher.watch_channel("shitposting");
        watcher.watch_channel("slack_api_testing");
        watcher
    }

    #[tokio::test]
    async fn missing_or_non_string_channel_prints_nothing() {
        let api = Arc::new(MockApi::new());
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        for raw in [
            json!({"text": "hi"}),
            json!({"channel": 7, "text": "hi"}),
            json!({"channel": null, "text": "hi", "files": [{"url_private": "u", "mimetype": "image/png"}]}),
        ] {
            let outcome = watcher.handle(&IncomingEvent::from_value(&raw)).await.unwrap();
            assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::NoChannel));
        }

        assert!(sink.texts().is_empty());
        assert!(sink.images().is_empty());
        assert_eq!(api.call_count(), 0);
        assert!(api.fetches().is_empty());
    }

    #[tokio::test]
    async fn resolved_watched_channel_prints_text() {
        let api = Arc::new(MockApi::new().with_channel("C123", "shitposting"));
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        let outcome = watcher
            .handle(&IncomingEvent::new("C123").with_text("hi"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Dispatch::Printed {
                text: true,
                images: 0
            }
        );
        assert_eq!(sink.texts(), vec!["hi\n"]);
    }

    #[tokio::test]
    async fn resolved_unwatched_channel_prints_nothing() {
        let api = Arc::new(MockApi::new().with_channel("C999", "random"));
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        let outcome = watcher
            .handle(
                &IncomingEvent::new("C999")
                    .with_text("hi")
                    .with_file(FileRef::new("u", "image/png")),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Dispatch::Ignored(IgnoreReason::NotWatched {
                channel: "C999".into(),
                name: "random".into()
            })
        );
        assert!(sink.texts().is_empty());
        assert!(api.fetches().is_empty());
    }

    #[tokio::test]
    async fn direct_name_match_prints_image_without_lookup() {
        let api = Arc::new(MockApi::new().with_file("u", png_bytes(64, 32)));
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        let outcome = watcher
            .handle(&IncomingEvent::new("shitposting").with_file(FileRef::new("u", "image/png")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Dispatch::Printed {
                text: false,
                images: 1
            }
        );
        assert_eq!(api.fetches(), vec!["u"]);
        assert_eq!(api.call_count(), 0);
        assert_eq!(sink.images(), vec![(64, 32)]);
        assert!(sink.texts().is_empty());
    }

    #[tokio::test]
    async fn watched_raw_id_matches_directly() {
        let api = Arc::new(MockApi::new());
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);
        watcher.watch_channel("GHUEMR31V");

        watcher
            .handle(&IncomingEvent::new("GHUEMR31V").with_text("private"))
            .await
            .unwrap();
        assert_eq!(sink.texts(), vec!["private\n"]);
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn unresolvable_channel_is_ignored_and_asked_once() {
        let api = Arc::new(MockApi::new().with_response(
            json!({"ok": false, "error": "method_not_supported_for_channel_type"}),
        ));
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        for _ in 0..3 {
            let outcome = watcher
                .handle(&IncomingEvent::new("D1").with_text("dm"))
                .await
                .unwrap();
            assert_eq!(
                outcome,
                Dispatch::Ignored(IgnoreReason::Unresolved {
                    channel: "D1".into()
                })
            );
        }
        assert_eq!(api.call_count(), 1);
        assert!(sink.texts().is_empty());
    }

    #[tokio::test]
    async fn repeated_events_resolve_once() {
        let api = Arc::new(MockApi::new().with_channel("C123", "shitposting"));
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        for text in ["one", "two", "three"] {
            watcher
                .handle(&IncomingEvent::new("C123").with_text(text))
                .await
                .unwrap();
        }
        assert_eq!(api.call_count(), 1);
        assert_eq!(sink.texts(), vec!["one\n", "two\n", "three\n"]);
    }

    #[tokio::test]
    async fn empty_text_and_non_images_are_skipped() {
        let api = Arc::new(MockApi::new());
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        let outcome = watcher
            .handle(
                &IncomingEvent::new("shitposting")
                    .with_text("")
                    .with_file(FileRef::new("doc", "application/pdf"))
                    .with_file(FileRef {
                        url: None,
                        mimetype: Some("image/png".into()),
                    }),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Dispatch::Printed {
                text: false,
                images: 0
            }
        );
        assert!(api.fetches().is_empty());
        assert!(sink.texts().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_error() {
        let api = Arc::new(MockApi::new().with_transport_failure("network unreachable"));
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        let result = watcher.handle(&IncomingEvent::new("C123").with_text("hi")).await;
        assert!(result.is_err());
        assert!(sink.texts().is_empty());
    }

    #[tokio::test]
    async fn printer_failure_does_not_stop_the_run_loop() {
        let api = Arc::new(MockApi::new().with_channel("C123", "shitposting"));
        let sink = Arc::new(RecordingSink::new().failing_text(1));
        let mut watcher = watcher(&api, &sink);

        let (tx, rx) = mpsc::channel(8);
        tx.send(IncomingEvent::new("C123").with_text("jammed"))
            .await
            .unwrap();
        tx.send(IncomingEvent::new("C123").with_text("next"))
            .await
            .unwrap();
        drop(tx);

        watcher.run(rx).await;
        assert_eq!(sink.texts(), vec!["next\n"]);
    }

    #[tokio::test]
    async fn run_loop_survives_transport_failure() {
        let api = Arc::new(
            MockApi::new()
                .with_channel("C123", "shitposting")
                .with_transport_failure("timeout"),
        );
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        let (tx, rx) = mpsc::channel(8);
        tx.send(IncomingEvent::new("C123").with_text("lost"))
            .await
            .unwrap();
        tx.send(IncomingEvent::new("C123").with_text("printed"))
            .await
            .unwrap();
        drop(tx);

        watcher.run(rx).await;
        assert_eq!(sink.texts(), vec!["printed\n"]);
    }

    #[tokio::test]
    async fn failed_deliveries_are_not_counted() {
        let api = Arc::new(
            MockApi::new()
                .with_file("bad", b"not a png".to_vec())
                .with_file("good", png_bytes(16, 16)),
        );
        let sink = Arc::new(RecordingSink::new().failing_text(1));
        let mut watcher = watcher(&api, &sink);

        let outcome = watcher
            .handle(
                &IncomingEvent::new("shitposting")
                    .with_text("jammed")
                    .with_file(FileRef::new("bad", "image/png"))
                    .with_file(FileRef::new("good", "image/png")),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Dispatch::Printed {
                text: false,
                images: 1
            }
        );
        assert!(sink.texts().is_empty());
        assert_eq!(sink.images(), vec![(16, 16)]);
    }

    #[tokio::test]
    async fn image_printer_failure_is_not_counted() {
        let api = Arc::new(MockApi::new().with_file("u", png_bytes(8, 8)));
        let sink = Arc::new(RecordingSink::new().failing_images());
        let mut watcher = watcher(&api, &sink);

        let outcome = watcher
            .handle(
                &IncomingEvent::new("shitposting")
                    .with_text("caption")
                    .with_file(FileRef::new("u", "image/png")),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Dispatch::Printed {
                text: true,
                images: 0
            }
        );
    }

    #[tokio::test]
    async fn clearing_the_resolver_looks_channels_up_again() {
        let api = Arc::new(MockApi::new().with_channel("C123", "shitposting"));
        let sink = Arc::new(RecordingSink::new());
        let mut watcher = watcher(&api, &sink);

        let event = IncomingEvent::new("C123").with_text("hi");
        watcher.handle(&event).await.unwrap();
        watcher.handle(&event).await.unwrap();
        assert_eq!(api.call_count(), 1);

        watcher.resolver_mut().clear();
        assert!(watcher.resolver_mut().is_empty());

        watcher.handle(&event).await.unwrap();
        assert_eq!(api.call_count(), 2);
        assert_eq!(sink.texts(), vec!["hi\n", "hi\n", "hi\n"]);
    }

    #[test]
    fn watch_list_from_iter() {
        let list: WatchList = ["a", "b"].into_iter().collect();
        assert!(list.contains("a"));
        assert!(!list.contains("c"));
        assert_eq!(list.len(), 2);
    }
}

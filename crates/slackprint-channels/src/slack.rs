//! Slack event source using slack-morphism with Socket Mode.
//!
//! Every `message` push event is forwarded, as an [`IncomingEvent`], to the
//! watcher's queue. Filtering happens in the watcher, not here.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use slack_morphism::prelude::*;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use slackprint_config::SlackConfig;
use slackprint_core::IncomingEvent;

/// State passed to the Socket Mode push event handler via SlackClientEventsUserState.
struct SlackPushState {
    events_tx: mpsc::Sender<IncomingEvent>,
}

/// Socket Mode listener feeding message events into an mpsc queue.
pub struct SlackEventSource {
    client: Arc<SlackHyperClient>,
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    serve_task: Mutex<Option<JoinHandle<()>>>,
}

impl SlackEventSource {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        if config.app_token.is_empty() {
            bail!("Slack app token (xapp-*) not configured");
        }
        if config.bot_token.is_empty() {
            bail!("Slack bot token (xoxb-*) not configured");
        }

        let connector = SlackClientHyperConnector::new()
            .map_err(|e| anyhow!("Failed to create Slack HTTP connector: {e}"))?;

        Ok(Self {
            client: Arc::new(SlackClient::new(connector)),
            app_token: SlackApiToken::new(config.app_token.clone().into()),
            bot_token: SlackApiToken::new(config.bot_token.clone().into()),
            serve_task: Mutex::new(None),
        })
    }

    /// `auth.test` with the bot token.
    async fn verify_identity(&self) -> Result<()> {
        let identity = self
            .client
            .open_session(&self.bot_token)
            .auth_test()
            .await
            .map_err(|e| anyhow!("Failed to verify Slack bot identity: {e}"))?;
        info!(
            "Slack bot @{} connected (team: {})",
            identity.user.as_deref().unwrap_or("unknown"),
            identity.team,
        );
        Ok(())
    }

    /// Verify the bot identity, open the Socket Mode connection and serve it
    /// on a background task until [`stop`](Self::stop) is called.
    pub async fn start(&self, events_tx: mpsc::Sender<IncomingEvent>) -> Result<()> {
        self.verify_identity().await?;

        let environment = Arc::new(
            SlackClientEventsListenerEnvironment::new(self.client.clone())
                .with_error_handler(slack_error_handler)
                .with_user_state(SlackPushState { events_tx }),
        );
        let listener = SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            environment,
            SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event),
        );
        listener
            .listen_for(&self.app_token)
            .await
            .map_err(|e| anyhow!("Failed to start Slack Socket Mode: {e}"))?;
        info!("Listening for Slack events (Socket Mode)");

        let task = tokio::spawn(async move {
            listener.serve().await;
            info!("Slack Socket Mode listener stopped");
        });
        if let Some(previous) = self.serve_task.lock().await.replace(task) {
            previous.abort();
        }
        Ok(())
    }

    /// Drop the Socket Mode connection. Safe to call when not started.
    pub async fn stop(&self) -> Result<()> {
        if let Some(task) = self.serve_task.lock().await.take() {
            debug!("Stopping Slack listener");
            task.abort();
        }
        Ok(())
    }
}

/// Push event handler. Must be a plain function (not a closure) for slack-morphism.
async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let msg_event = match event.event {
        SlackEventCallbackBody::Message(ev) => ev,
        _ => return Ok(()),
    };

    let incoming = to_incoming(&msg_event)?;
    debug!(
        "Slack message event in {}: {} file(s)",
        incoming.channel.as_deref().unwrap_or("?"),
        incoming.files.len()
    );

    let events_tx = {
        let state_guard = states.read().await;
        match state_guard.get_user_state::<SlackPushState>() {
            Some(state) => state.events_tx.clone(),
            None => {
                error!("SlackPushState not found in user state");
                return Ok(());
            }
        }
    };

    if let Err(e) = events_tx.send(incoming).await {
        error!("Failed to queue Slack event: {e}");
    }

    Ok(())
}

/// Convert through the raw JSON shape so the watcher sees exactly the
/// `channel` / `text` / `files[].url_private` / `files[].mimetype` fields Slack sent.
fn to_incoming(event: &SlackMessageEvent) -> serde_json::Result<IncomingEvent> {
    let raw = serde_json::to_value(event)?;
    Ok(IncomingEvent::from_value(&raw))
}

fn slack_error_handler(
    err: Box<dyn std::error::Error + Send + Sync>,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> HttpStatusCode {
    error!("Slack Socket Mode error: {err}");
    HttpStatusCode::OK
}

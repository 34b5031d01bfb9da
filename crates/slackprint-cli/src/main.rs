mod offline;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slackprint_channels::{read_events, SlackEventSource, SlackWebClient};
use slackprint_config::{find_config_path, load_config, save_config, Config};
use slackprint_core::imaging::fit_to_width;
use slackprint_core::text::terminate_line;
use slackprint_core::{ChannelWatcher, Dispatch, PrinterSink, RetryPolicy, SlackApi, WatchList};
use slackprint_printer::{build_sink, PrinterTarget};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::offline::OfflineApi;

/// Events buffered between the Socket Mode listener and the watcher.
const EVENT_QUEUE: usize = 256;

#[derive(Parser)]
#[command(name = "slackprint", about = "Print Slack channels on a receipt printer", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Slack and print watched channels until interrupted
    Watch {
        /// Log output instead of printing
        #[arg(long)]
        dry_run: bool,
    },
    /// Feed newline-delimited JSON message events through the watcher
    Replay {
        /// Event file, one raw message event per line
        file: PathBuf,
        /// Log output instead of printing
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a line of text and/or a local image to check the printer
    TestPrint {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
        /// Log output instead of printing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show configuration
    Status {
        /// Write a default config file if none exists
        #[arg(long)]
        write_default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(find_config_path);

    match cli.command {
        Commands::Status { write_default } => run_status(&config_path, write_default),
        Commands::Watch { dry_run } => {
            let config = load_config(&config_path)?;
            run_watch(&config, dry_run).await
        }
        Commands::Replay { file, dry_run } => {
            let config = load_config(&config_path)?;
            run_replay(&config, &file, dry_run).await
        }
        Commands::TestPrint {
            text,
            image,
            dry_run,
        } => {
            let config = load_config(&config_path)?;
            run_test_print(&config, text, image, dry_run).await
        }
    }
}

fn build_watcher(
    config: &Config,
    client: Arc<dyn SlackApi>,
    sink: Arc<dyn PrinterSink>,
    policy: RetryPolicy,
) -> ChannelWatcher {
    if config.watch.channels.is_empty() {
        warn!("No channels configured under watch.channels, nothing will be printed");
    }
    let watch_list: WatchList = config.watch.channels.iter().cloned().collect();
    ChannelWatcher::new(client, sink, policy, config.printer.max_image_width)
        .with_watch_list(watch_list)
}

async fn run_watch(config: &Config, dry_run: bool) -> Result<()> {
    let client: Arc<dyn SlackApi> = Arc::new(SlackWebClient::new(config.slack.bot_token.clone())?);
    let sink = build_sink(&config.printer, dry_run);
    let mut watcher = build_watcher(config, client, sink, RetryPolicy::from(&config.retry));

    let source = SlackEventSource::new(&config.slack)?;
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
    source.start(events_tx).await?;

    tokio::select! {
        _ = watcher.run(events_rx) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    source.stop().await
}

async fn run_replay(config: &Config, file: &Path, dry_run: bool) -> Result<()> {
    let events = read_events(file)?;

    let mut policy = RetryPolicy::from(&config.retry);
    let client: Arc<dyn SlackApi> = if config.slack.bot_token.is_empty() {
        warn!("No Slack bot token configured, only channels watched by name will match");
        policy.max_attempts = 1;
        Arc::new(OfflineApi)
    } else {
        Arc::new(SlackWebClient::new(config.slack.bot_token.clone())?)
    };
    let sink = build_sink(&config.printer, dry_run);
    let mut watcher = build_watcher(config, client, sink, policy);

    let mut printed = 0;
    for event in &events {
        match watcher.handle(event).await {
            Ok(Dispatch::Printed { .. }) => printed += 1,
            Ok(Dispatch::Ignored(reason)) => info!("Ignored event: {reason:?}"),
            Err(e) => error!("Failed to handle event: {e}"),
        }
    }
    info!("Replayed {} event(s), {printed} printed", events.len());
    Ok(())
}

async fn run_test_print(
    config: &Config,
    text: Option<String>,
    image_path: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let sink = build_sink(&config.printer, dry_run);
    let text = match (&text, &image_path) {
        (None, None) => Some("slackprint test page".to_string()),
        _ => text,
    };

    if let Some(text) = text {
        sink.print_text(&terminate_line(&text))
            .await
            .context("printing text failed")?;
    }

    if let Some(path) = image_path {
        let decoded = image::open(&path)
            .with_context(|| format!("failed to open image '{}'", path.display()))?;
        let fitted = fit_to_width(decoded, config.printer.max_image_width);
        info!("Printing {}x{} image", fitted.width(), fitted.height());
        sink.print_image(&fitted)
            .await
            .context("printing image failed")?;
    }

    Ok(())
}

fn run_status(config_path: &Path, write_default: bool) -> Result<()> {
    println!("slackprint status");
    println!();

    if config_path.exists() {
        println!("  Config:    {} (found)", config_path.display());
    } else if write_default {
        save_config(config_path, &Config::default())?;
        println!("  Config:    {} (created with defaults)", config_path.display());
    } else {
        println!(
            "  Config:    {} (not found, run `slackprint status --write-default`)",
            config_path.display()
        );
        return Ok(());
    }

    let config = load_config(config_path)?;
    println!(
        "  Bot token: {}",
        if config.slack.bot_token.is_empty() {
            "not configured"
        } else {
            "configured"
        }
    );
    println!(
        "  App token: {}",
        if config.slack.app_token.is_empty() {
            "not configured"
        } else {
            "configured"
        }
    );
    println!();

    println!("  Printer:   {}", PrinterTarget::from_config(&config.printer));
    println!("  Max width: {} dots", config.printer.max_image_width);
    println!(
        "  Retry:     {} attempt(s), {}s apart",
        config.retry.max_attempts, config.retry.sleep_secs
    );
    println!();

    if config.watch.channels.is_empty() {
        println!("  Watching:  (none)");
    } else {
        println!("  Watching:");
        for channel in &config.watch.channels {
            println!("    {channel}");
        }
    }

    Ok(())
}

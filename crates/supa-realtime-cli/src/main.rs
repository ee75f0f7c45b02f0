//! supa-listen: join realtime channels and print their events.
//!
//! Every inbound event is written to stdout as one JSON object per line:
//! `{"topic": ..., "event": ..., "payload": ...}`. Logs go to stderr.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Value};
use supa_common::SupaError;
use supa_config::{toml_loader, validation, SupaConfig};
use supa_realtime::{RealtimeChannel, RealtimeClient, StaticSessionProvider};
use tokio::sync::broadcast::error::RecvError;

const DEFAULT_EVENTS: &[&str] = &[
    "broadcast",
    "presence_state",
    "presence_diff",
    "postgres_changes",
];

#[derive(Parser)]
#[command(name = "supa-listen", about = "Print realtime channel events as JSON lines")]
struct Args {
    /// Config file (defaults to the platform config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Websocket URL, replacing the one derived from the project host.
    #[arg(long)]
    url: Option<String>,

    /// Access token of a signed-in user.
    #[arg(long)]
    token: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,

    /// Topic to join; repeat for several.
    #[arg(short, long = "topic", required = true)]
    topics: Vec<String>,

    /// Event to print; repeat for several.
    #[arg(short, long = "event")]
    events: Vec<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("supa-listen: {e}");
            std::process::exit(1);
        }
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("supa_listen={level},supa_realtime={level}").into()),
        )
        .init();

    if let Err(e) = run(args, config).await {
        tracing::error!(error = %e, "supa-listen failed");
        std::process::exit(1);
    }
}

/// Load the file, apply flag overrides, then validate the result.
fn load_config(args: &Args) -> Result<SupaConfig, SupaError> {
    let mut config = match &args.config {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    if let Some(url) = &args.url {
        config.realtime.custom_url = Some(url.clone());
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    validation::validate(&config)?;
    Ok(config)
}

async fn run(args: Args, config: SupaConfig) -> Result<(), SupaError> {
    let session = match args.token {
        Some(token) => StaticSessionProvider::with_token(token),
        None => StaticSessionProvider::anonymous(),
    };
    let client = RealtimeClient::with_tungstenite(
        settings::realtime_config(&config),
        Arc::new(session),
    );
    client.on_status_change(|status| tracing::info!(status = %status, "Connection status"));

    client.connect().await?;

    let events: Vec<String> = if args.events.is_empty() {
        DEFAULT_EVENTS.iter().map(|e| e.to_string()).collect()
    } else {
        args.events
    };

    let mut channels: Vec<RealtimeChannel> = Vec::new();
    for topic in &args.topics {
        let mut builder = client.channel(topic.clone());
        for event in &events {
            let (topic, name) = (topic.clone(), event.clone());
            builder = builder.on(event.clone(), move |payload: &Value| {
                print_event(&topic, &name, payload)
            });
        }
        channels.push(builder.build_and_join().await?);
    }

    let mut diagnostics = client.diagnostics();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            diagnostic = diagnostics.recv() => match diagnostic {
                Ok(diagnostic) => tracing::debug!(?diagnostic, "Recovered realtime failure"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Diagnostics lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::info!("Shutting down");
    for channel in &channels {
        channel.leave().await;
    }
    client.disconnect().await;
    Ok(())
}

fn print_event(topic: &str, event: &str, payload: &Value) {
    println!(
        "{}",
        json!({ "topic": topic, "event": event, "payload": payload })
    );
}

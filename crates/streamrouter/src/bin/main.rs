//! `streamrouter`: reads newline-delimited JSON messages from stdin,
//! routes each against a catalogue of streams, and prints the matched
//! stream ids to stdout as JSON.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Deserialize;
use streamrouter::StreamRouterApp;
use streamrouter_domain::entities::{Message, Stream};
use streamrouter_domain::value_objects::FieldValue;
use streamrouter_infrastructure::{InMemoryCatalogue, NullMetricsProvider, RouterConfig};

/// A log-ingestion stream-routing engine.
#[derive(Parser)]
#[command(name = "streamrouter")]
#[command(about = "Routes newline-delimited JSON log messages against a stream catalogue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to a TOML file with the engine's tunables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a JSON file containing the array of streams to seed the
    /// in-memory catalogue with.
    #[arg(long)]
    streams: Option<PathBuf>,
}

#[derive(Deserialize)]
struct InboundMessage {
    id: String,
    message: String,
    source: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RouterConfig::load(path).context("loading router configuration")?,
        None => RouterConfig::from_env().context("reading router configuration from environment")?,
    };

    let catalogue = Arc::new(InMemoryCatalogue::new());
    if let Some(path) = &cli.streams {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading streams file {}", path.display()))?;
        let streams: Vec<Stream> =
            serde_json::from_str(&contents).context("parsing streams file as JSON")?;
        for stream in streams {
            catalogue.put(stream).await;
        }
    }

    let metrics = Arc::new(NullMetricsProvider::new());
    let app = StreamRouterApp::new(catalogue, metrics, config);
    app.rebuild_once().await;
    app.spawn_updater();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match route_line(&app, trimmed).await {
            Ok(matched) => println!("{}", serde_json::json!({ "streams": matched })),
            Err(err) => tracing::warn!(%err, "failed to route message"),
        }
    }

    Ok(())
}

async fn route_line(
    app: &StreamRouterApp<Arc<InMemoryCatalogue>>,
    line: &str,
) -> Result<Vec<String>> {
    let inbound: InboundMessage = serde_json::from_str(line).context("parsing message JSON")?;
    let mut message = Message::new(inbound.id, inbound.message, inbound.source, inbound.timestamp)
        .context("constructing message")?;
    for (name, value) in inbound.fields {
        if let Err(err) = message.set_field(&name, value) {
            tracing::warn!(field = %name, %err, "skipping invalid field");
        }
    }

    let matched = app.router.route(&mut message).await;
    if let Some(recordings) = message.recordings() {
        tracing::debug!(
            message_id = %message.id(),
            rules_evaluated = recordings.counter("rules.evaluated"),
            streams_evaluated = recordings.counter("streams.evaluated"),
            streams_matched = recordings.counter("streams.matched"),
            "message recordings"
        );
    }
    Ok(matched.into_iter().map(|s| s.id.to_string()).collect())
}

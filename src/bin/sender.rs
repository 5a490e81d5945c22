//! Audio Sender Application
//!
//! Streams every audio file in a directory to a receiver over UDP, one
//! concurrent stream per file.
//!
//! Usage: `sender [SOURCE_DIR_OR_FILE] [HOST:PORT]`

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use udp_audio_streamer::{
    config::AppConfig,
    streams::{discover_sources, StreamManager, StreamStatus},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting UDP Audio Sender");

    let mut config = AppConfig::load_or_default().context("Failed to load configuration")?;

    let source = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.streams.source_dir.clone());

    if let Some(target) = std::env::args().nth(2) {
        let (host, port) = target
            .rsplit_once(':')
            .with_context(|| format!("Invalid target address '{}', expected HOST:PORT", target))?;
        config.sender.host = host.trim_matches(|c| c == '[' || c == ']').to_string();
        config.sender.port = port
            .parse()
            .with_context(|| format!("Invalid port in target address '{}'", target))?;
    }
    config.sender.validate().map_err(anyhow::Error::msg)?;

    let sources = if source.is_file() {
        vec![source.clone()]
    } else {
        discover_sources(&source, &config.streams.extension)
            .with_context(|| format!("Could not read directory '{}'", source.display()))?
    };

    if sources.is_empty() {
        tracing::warn!(
            "No .{} files found in '{}'",
            config.streams.extension,
            source.display()
        );
        return Ok(());
    }

    tracing::info!("Target receiver: {}:{}", config.sender.host, config.sender.port);

    let manager = StreamManager::from_config(&config);

    let cancel = manager.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping all streams");
            cancel.cancel();
        }
    });

    let outcomes = manager.run(sources).await;

    println!();
    for outcome in &outcomes {
        let name = outcome
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match &outcome.status {
            StreamStatus::Completed(report) => println!(
                "(stream {}) Sender for file '{}' finished in {} ms ({} datagrams, {} throttled, port {})",
                outcome.index,
                name,
                outcome.elapsed.as_millis(),
                report.datagrams_sent,
                report.throttle_events,
                report.local_addr.port()
            ),
            StreamStatus::Failed(err) => {
                println!("(stream {}) Sender for file '{}' failed: {}", outcome.index, name, err)
            }
            StreamStatus::TimedOut => println!(
                "(stream {}) Sender for file '{}' did not finish within the timeout",
                outcome.index, name
            ),
            StreamStatus::Crashed(reason) => {
                println!("(stream {}) Sender for file '{}' crashed: {}", outcome.index, name, reason)
            }
        }
    }

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    tracing::info!("{}/{} streams completed", succeeded, outcomes.len());

    Ok(())
}

//! Audio Receiver Application
//!
//! Listens for framed datagrams and prints the metadata and latency of each.
//!
//! Usage: `receiver [PORT]`

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use udp_audio_streamer::{config::AppConfig, network::StreamReceiver};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting UDP Audio Receiver");

    let mut config = AppConfig::load_or_default().context("Failed to load configuration")?;
    if let Some(port) = std::env::args().nth(1) {
        config.receiver.port = port
            .parse()
            .with_context(|| format!("Invalid port '{}'", port))?;
    }

    let mut receiver = StreamReceiver::bind(&config.receiver)?;
    println!("Server listening on port {}...", receiver.local_addr()?.port());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let stats = receiver
        .receive_loop(&cancel, |received| {
            println!(
                "RECEIVED DATAGRAM\n -address    {}\n -port       {}\n -sequence   {}\n -timestamp  {}\n -audio data {} (bytes)\n -latency    {} (ms)\n",
                received.from.ip(),
                received.from.port(),
                received.frame.sequence,
                received.frame.timestamp_ms,
                received.frame.payload.len(),
                received.latency_ms
            );
        })
        .await?;

    tracing::info!(
        "Receiver stats: {} packets, {} bytes, {} invalid",
        stats.packets_received,
        stats.bytes_received,
        stats.invalid_packets
    );

    Ok(())
}

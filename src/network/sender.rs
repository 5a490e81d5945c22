//! Outbound stream sender
//!
//! Reads a byte source in fixed-size chunks and sends each chunk as one
//! framed datagram, pacing itself with the [`RateGovernor`].

use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::codec;
use crate::config::SenderConfig;
use crate::error::StreamError;
use crate::network::governor::{RateGovernor, Throttle};
use crate::network::udp::{create_send_socket, SocketOptions};
use crate::protocol::now_ms;

/// Summary of one finished stream
#[derive(Debug, Clone)]
pub struct StreamReport {
    /// Label of the byte source (file name for files)
    pub source: String,
    /// Ephemeral local address the datagrams were sent from
    pub local_addr: SocketAddr,
    /// Resolved destination
    pub destination: SocketAddr,
    /// Sequence number of the first datagram, if any was sent
    pub first_sequence: Option<u64>,
    pub datagrams_sent: u64,
    /// Payload bytes read from the source
    pub payload_bytes: u64,
    /// Datagram bytes put on the wire, header included
    pub wire_bytes: u64,
    pub throttle_events: u64,
    pub elapsed: Duration,
}

/// Lifetime totals of a sender instance
#[derive(Debug, Clone, Default)]
pub struct SenderStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub throttle_events: u64,
    pub streams_completed: u64,
}

/// Owns one outbound stream's counters.
///
/// The sequence counter starts at 1 and is never reset, so streaming several
/// sources with the same instance keeps numbering where the last one stopped.
pub struct StreamSender {
    config: SenderConfig,
    governor: RateGovernor,
    cancel: CancellationToken,
    sequence: u64,
    bytes_sent: u64,
    last_send: Instant,
    stats: SenderStats,
}

impl StreamSender {
    /// Create a sender for the given destination and chunk size
    pub fn new(config: SenderConfig) -> Result<Self, StreamError> {
        config.validate().map_err(StreamError::InvalidConfig)?;

        let governor = RateGovernor::new(config.max_bytes_per_ms, config.throttle_delay());

        Ok(Self {
            config,
            governor,
            cancel: CancellationToken::new(),
            sequence: 1,
            bytes_sent: 0,
            last_send: Instant::now(),
            stats: SenderStats::default(),
        })
    }

    /// Tie this sender to an external cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Sequence number the next datagram will carry
    pub fn next_sequence(&self) -> u64 {
        self.sequence
    }

    /// Cumulative datagram bytes sent by this instance
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn stats(&self) -> SenderStats {
        self.stats.clone()
    }

    /// Stream the file at `path`
    pub async fn stream_file(&mut self, path: impl AsRef<Path>) -> Result<StreamReport, StreamError> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| StreamError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.stream_source(BufReader::new(file), &label).await
    }

    /// Stream any sequential byte source until it reports end of data
    pub async fn stream_source<R>(&mut self, mut source: R, label: &str) -> Result<StreamReport, StreamError>
    where
        R: AsyncRead + Unpin,
    {
        let destination = self.resolve().await?;
        let socket = create_send_socket(
            destination,
            SocketOptions {
                send_buffer_size: self.config.send_buffer_size,
                ..Default::default()
            },
        )
        .map_err(StreamError::ChannelUnavailable)?;
        let local_addr = socket.local_addr().map_err(StreamError::ChannelUnavailable)?;

        info!("Sender for '{}' is using port {}", label, local_addr.port());

        let start = Instant::now();
        let mut report = StreamReport {
            source: label.to_string(),
            local_addr,
            destination,
            first_sequence: None,
            datagrams_sent: 0,
            payload_bytes: 0,
            wire_bytes: 0,
            throttle_events: 0,
            elapsed: Duration::ZERO,
        };

        let mut chunk = vec![0u8; self.config.chunk_size];

        loop {
            if self.cancel.is_cancelled() {
                return Err(StreamError::Cancelled { sequence: self.sequence });
            }

            let len = read_chunk(&mut source, &mut chunk)
                .await
                .map_err(|source| StreamError::StreamAborted {
                    sequence: self.sequence,
                    source,
                })?;
            if len == 0 {
                break;
            }

            let throttle = self
                .governor
                .check(self.bytes_sent, self.last_send.elapsed(), &self.cancel)
                .await
                .map_err(|_| StreamError::Cancelled { sequence: self.sequence })?;
            if throttle == Throttle::Delayed {
                report.throttle_events += 1;
                self.stats.throttle_events += 1;
            }

            let datagram = codec::encode(self.sequence, now_ms(), &chunk[..len]);
            socket
                .send_to(&datagram, destination)
                .await
                .map_err(|source| StreamError::StreamAborted {
                    sequence: self.sequence,
                    source,
                })?;

            report.first_sequence.get_or_insert(self.sequence);
            report.datagrams_sent += 1;
            report.payload_bytes += len as u64;
            report.wire_bytes += datagram.len() as u64;

            self.sequence += 1;
            self.last_send = Instant::now();
            self.bytes_sent += datagram.len() as u64;
            self.stats.packets_sent += 1;
            self.stats.bytes_sent += datagram.len() as u64;

            // A short read only happens at end of data
            if len < chunk.len() {
                break;
            }
        }

        report.elapsed = start.elapsed();
        self.stats.streams_completed += 1;

        info!(
            "Sender for '{}' finished: {} datagrams, {} bytes in {:?}",
            label, report.datagrams_sent, report.wire_bytes, report.elapsed
        );

        Ok(report)
    }

    async fn resolve(&self) -> Result<SocketAddr, StreamError> {
        let host = self.config.host.as_str();
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, self.config.port))
            .await
            .map_err(|source| StreamError::AddressUnresolvable {
                host: host.to_string(),
                source: Some(source),
            })?
            .collect();

        // Receivers listen on IPv4 by default, so prefer an IPv4 result
        let addr = addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| StreamError::AddressUnresolvable {
                host: host.to_string(),
                source: None,
            })?;

        debug!("Resolved {} to {}", host, addr);
        Ok(addr)
    }
}

/// Fill `buf` from `source`, returning fewer bytes only at end of data
async fn read_chunk<R>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

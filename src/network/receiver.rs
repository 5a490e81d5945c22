//! Inbound stream receiver
//!
//! Decodes every datagram on its own. Nothing is buffered, reordered or
//! deduplicated; a malformed datagram is logged, counted and skipped.

use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::ReceiverConfig;
use crate::error::{FrameError, ReceiveError};
use crate::network::udp::{create_recv_socket, SocketOptions, UdpSocket};
use crate::protocol::{now_ms, Frame};

/// A decoded frame together with where and when it arrived
#[derive(Debug, Clone)]
pub struct ReceivedFrame {
    /// Sender address and port
    pub from: SocketAddr,
    pub frame: Frame,
    /// Local wall-clock arrival time in ms since the epoch
    pub arrival_ms: u64,
    /// `arrival_ms - frame.timestamp_ms`
    pub latency_ms: i64,
}

/// What one datagram turned into
#[derive(Debug)]
pub enum Datagram {
    Frame(ReceivedFrame),
    Malformed { from: SocketAddr, error: FrameError },
}

/// Receiver statistics
#[derive(Debug, Clone, Default)]
pub struct ReceiverStats {
    pub packets_received: u64,
    pub bytes_received: u64,
    pub invalid_packets: u64,
}

/// Listens on one local UDP port
pub struct StreamReceiver {
    socket: UdpSocket,
    idle_timeout: Option<Duration>,
    buffer: Vec<u8>,
    stats: ReceiverStats,
}

impl StreamReceiver {
    /// Bind the listening socket
    pub fn bind(config: &ReceiverConfig) -> Result<Self, ReceiveError> {
        let socket = create_recv_socket(
            config.port,
            SocketOptions {
                recv_buffer_size: config.recv_buffer_size,
                ..Default::default()
            },
        )
        .map_err(|source| ReceiveError::ChannelUnavailable {
            port: config.port,
            source,
        })?;

        Ok(Self {
            socket,
            idle_timeout: config.idle_timeout(),
            buffer: vec![0u8; config.max_datagram_size.max(1)],
            stats: ReceiverStats::default(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats.clone()
    }

    /// Wait for one datagram and decode it.
    ///
    /// Fails with [`ReceiveError::ReceiveTimeout`] when an idle timeout is
    /// configured and nothing arrives in time.
    pub async fn recv(&mut self) -> Result<Datagram, ReceiveError> {
        let received = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.socket.recv_from(&mut self.buffer))
                .await
                .map_err(|_| ReceiveError::ReceiveTimeout(limit))?,
            None => self.socket.recv_from(&mut self.buffer).await,
        };
        let (len, from) = received.map_err(ReceiveError::ReceiveFailed)?;
        let arrival_ms = now_ms();

        self.stats.packets_received += 1;
        self.stats.bytes_received += len as u64;

        match codec::decode(&self.buffer[..len]) {
            Ok(frame) => {
                let latency_ms = frame.latency_ms(arrival_ms);
                Ok(Datagram::Frame(ReceivedFrame {
                    from,
                    frame,
                    arrival_ms,
                    latency_ms,
                }))
            }
            Err(error) => {
                self.stats.invalid_packets += 1;
                Ok(Datagram::Malformed { from, error })
            }
        }
    }

    /// Receive until `cancel` fires, calling `on_frame` for every valid frame.
    ///
    /// Malformed datagrams never end the loop. Cancellation ends it with
    /// `Ok` and the statistics gathered so far.
    pub async fn receive_loop<F>(
        &mut self,
        cancel: &CancellationToken,
        mut on_frame: F,
    ) -> Result<ReceiverStats, ReceiveError>
    where
        F: FnMut(ReceivedFrame),
    {
        info!("Receiver listening on {:?}", self.socket.local_addr().ok());

        loop {
            let datagram = tokio::select! {
                _ = cancel.cancelled() => break,
                datagram = self.recv() => datagram?,
            };

            match datagram {
                Datagram::Frame(received) => {
                    debug!(
                        from = %received.from,
                        sequence = received.frame.sequence,
                        latency_ms = received.latency_ms,
                        "Received frame"
                    );
                    on_frame(received);
                }
                Datagram::Malformed { from, error } => {
                    warn!("Error parsing metadata from packet sent by {}: {}", from, error);
                }
            }
        }

        info!(
            "Receiver stopped: {} packets, {} bytes, {} invalid",
            self.stats.packets_received, self.stats.bytes_received, self.stats.invalid_packets
        );
        Ok(self.stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SenderConfig;
    use crate::network::sender::StreamSender;
    use crate::network::udp::create_send_socket;
    use tokio::sync::mpsc;

    fn bind_ephemeral() -> (StreamReceiver, SocketAddr) {
        let receiver = StreamReceiver::bind(&ReceiverConfig::new(0)).unwrap();
        let port = receiver.local_addr().unwrap().port();
        (receiver, SocketAddr::from(([127, 0, 0, 1], port)))
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let (_receiver, addr) = bind_ephemeral();
        let err = StreamReceiver::bind(&ReceiverConfig::new(addr.port()))
            .err()
            .unwrap();
        assert!(matches!(err, ReceiveError::ChannelUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_recv_decodes_and_measures_latency() {
        let (mut receiver, addr) = bind_ephemeral();
        let socket = create_send_socket(addr, SocketOptions::default()).unwrap();

        let sent_at = now_ms() - 250;
        socket
            .send_to(&codec::encode(2, sent_at, b"payload"), addr)
            .await
            .unwrap();

        match receiver.recv().await.unwrap() {
            Datagram::Frame(received) => {
                assert_eq!(received.frame.sequence, 2);
                assert_eq!(&received.frame.payload[..], b"payload");
                assert_eq!(received.from.port(), socket.local_addr().unwrap().port());
                assert!(received.latency_ms >= 250);
                assert_eq!(received.latency_ms, received.arrival_ms as i64 - sent_at as i64);
            }
            other => panic!("unexpected datagram: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_does_not_stop_loop() {
        let (mut receiver, addr) = bind_ephemeral();
        let socket = create_send_socket(addr, SocketOptions::default()).unwrap();
        socket.send_to(b"garbage without delimiters", addr).await.unwrap();
        socket.send_to(&codec::encode(9, now_ms(), b"ok"), addr).await.unwrap();

        let cancel = CancellationToken::new();
        let mut frames = Vec::new();
        let stats = {
            let cancel_inner = cancel.clone();
            receiver
                .receive_loop(&cancel, |received| {
                    frames.push(received.frame.sequence);
                    cancel_inner.cancel();
                })
                .await
                .unwrap()
        };

        assert_eq!(frames, vec![9]);
        assert_eq!(stats.packets_received, 2);
        assert_eq!(stats.invalid_packets, 1);
    }

    #[tokio::test]
    async fn test_idle_timeout() {
        let config = ReceiverConfig::new(0).with_idle_timeout(Duration::from_millis(50));
        let mut receiver = StreamReceiver::bind(&config).unwrap();

        let err = receiver
            .receive_loop(&CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiveError::ReceiveTimeout(d) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let (mut receiver, addr) = bind_ephemeral();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            receiver
                .receive_loop(&loop_cancel, move |received| {
                    let _ = tx.send(received);
                })
                .await
        });

        let data: Vec<u8> = (0..2500u32).map(|i| (i * 7) as u8).collect();
        let mut sender =
            StreamSender::new(SenderConfig::new("127.0.0.1", addr.port(), 1024)).unwrap();
        sender.stream_source(&data[..], "scenario").await.unwrap();

        let mut frames = Vec::new();
        while frames.len() < 3 {
            let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            frames.push(received);
        }
        cancel.cancel();
        let stats = handle.await.unwrap().unwrap();

        let sequences: Vec<_> = frames.iter().map(|r| r.frame.sequence).collect();
        let lengths: Vec<_> = frames.iter().map(|r| r.frame.payload.len()).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(lengths, vec![1024, 1024, 452]);
        assert!(frames.iter().all(|r| r.latency_ms >= 0));
        assert_eq!(stats.invalid_packets, 0);
    }
}

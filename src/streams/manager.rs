//! Concurrent stream runner
//!
//! Launches one task per source, each owning an independent sender, and
//! joins them under a single overall deadline. Streams still running at the
//! deadline are cancelled and reported as timed out.

use std::path::PathBuf;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{AppConfig, SenderConfig};
use crate::error::StreamError;
use crate::network::sender::{StreamReport, StreamSender};

/// How one stream ended
#[derive(Debug)]
pub enum StreamStatus {
    Completed(StreamReport),
    Failed(StreamError),
    /// Still running when the overall deadline passed
    TimedOut,
    /// The task panicked or was aborted
    Crashed(String),
}

type StreamResult = (Duration, Result<StreamReport, StreamError>);

/// Result for one source
#[derive(Debug)]
pub struct StreamOutcome {
    /// Position of the source in the input list
    pub index: usize,
    pub path: PathBuf,
    pub elapsed: Duration,
    pub status: StreamStatus,
}

impl StreamOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, StreamStatus::Completed(_))
    }
}

pub struct StreamManager {
    sender: SenderConfig,
    run_timeout: Duration,
    cancel: CancellationToken,
}

impl StreamManager {
    pub fn new(sender: SenderConfig, run_timeout: Duration) -> Self {
        Self {
            sender,
            run_timeout,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.sender.clone(), config.streams.run_timeout())
    }

    /// Parent token of every run; cancelling it stops all running streams
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stream every source concurrently and collect one outcome per source,
    /// in input order
    pub async fn run(&self, sources: Vec<PathBuf>) -> Vec<StreamOutcome> {
        info!(
            "Starting {} streams to {}:{} (timeout {:?})",
            sources.len(),
            self.sender.host,
            self.sender.port,
            self.run_timeout
        );

        let started = Instant::now();
        let deadline = started + self.run_timeout;
        let run_cancel = self.cancel.child_token();
        let handles: Vec<(PathBuf, JoinHandle<StreamResult>)> = sources
            .into_iter()
            .map(|path| {
                let handle = tokio::spawn(stream_one(
                    self.sender.clone(),
                    path.clone(),
                    run_cancel.clone(),
                ));
                (path, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (index, (path, mut handle)) in handles.into_iter().enumerate() {
            let joined = tokio::time::timeout_at(deadline, &mut handle).await.ok();
            if joined.is_none() {
                warn!("Stream {} ('{}') did not finish within the timeout", index, path.display());
                run_cancel.cancel();
                handle.abort();
            }

            let (elapsed, status) = settle(joined, started, deadline, Instant::now());
            match &status {
                StreamStatus::Failed(err) => {
                    error!("Stream {} ('{}') failed: {}", index, path.display(), err)
                }
                StreamStatus::Crashed(reason) => {
                    error!("Stream {} ('{}') crashed: {}", index, path.display(), reason)
                }
                _ => {}
            }

            outcomes.push(StreamOutcome {
                index,
                path,
                elapsed,
                status,
            });
        }

        outcomes
    }
}

/// Map a joined task onto its outcome.
///
/// `joined` is `None` when the task missed the deadline. A stream that stops
/// with `Cancelled` once the deadline has passed was stopped by the deadline
/// (a sibling timing out cancels the whole run), so it counts as timed out too.
fn settle(
    joined: Option<Result<StreamResult, JoinError>>,
    started: Instant,
    deadline: Instant,
    now: Instant,
) -> (Duration, StreamStatus) {
    let budget = deadline.saturating_duration_since(started);
    match joined {
        Some(Ok((elapsed, Ok(report)))) => (elapsed, StreamStatus::Completed(report)),
        Some(Ok((_, Err(StreamError::Cancelled { .. })))) if now >= deadline => {
            (budget, StreamStatus::TimedOut)
        }
        Some(Ok((elapsed, Err(err)))) => (elapsed, StreamStatus::Failed(err)),
        Some(Err(join_err)) => (
            now.saturating_duration_since(started),
            StreamStatus::Crashed(join_err.to_string()),
        ),
        None => (budget, StreamStatus::TimedOut),
    }
}

async fn stream_one(
    config: SenderConfig,
    path: PathBuf,
    cancel: CancellationToken,
) -> StreamResult {
    let start = Instant::now();
    let result = match StreamSender::new(config) {
        Ok(sender) => sender.with_cancellation(cancel).stream_file(&path).await,
        Err(err) => Err(err),
    };
    (start.elapsed(), result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::udp::{create_recv_socket, SocketOptions};

    fn temp_file(len: usize) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}.wav", uuid::Uuid::new_v4()));
        std::fs::write(&path, vec![5u8; len]).unwrap();
        path
    }

    #[tokio::test]
    async fn test_run_reports_in_input_order() {
        let socket = create_recv_socket(0, SocketOptions::default()).unwrap();
        let port = socket.local_addr().unwrap().port();

        let first = temp_file(3000);
        let missing = std::env::temp_dir().join(format!("{}.wav", uuid::Uuid::new_v4()));
        let second = temp_file(10);

        let manager = StreamManager::new(
            SenderConfig::new("127.0.0.1", port, 1024),
            Duration::from_secs(10),
        );
        let outcomes = manager
            .run(vec![first.clone(), missing.clone(), second.clone()])
            .await;
        let _ = std::fs::remove_file(&first);
        let _ = std::fs::remove_file(&second);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].path, first);
        assert_eq!(outcomes[1].path, missing);

        match &outcomes[0].status {
            StreamStatus::Completed(report) => {
                assert_eq!(report.datagrams_sent, 3);
                assert_eq!(report.first_sequence, Some(1));
            }
            other => panic!("unexpected status: {other:?}"),
        }
        assert!(matches!(
            outcomes[1].status,
            StreamStatus::Failed(StreamError::SourceUnavailable { .. })
        ));
        // Each stream has its own sender, so numbering starts over
        match &outcomes[2].status {
            StreamStatus::Completed(report) => assert_eq!(report.first_sequence, Some(1)),
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deadline_cancels_slow_streams() {
        let socket = create_recv_socket(0, SocketOptions::default()).unwrap();
        let port = socket.local_addr().unwrap().port();
        // Half a million tiny datagrams cannot finish within the deadline
        let path = temp_file(8 * 1024 * 1024);
        let config = SenderConfig::new("127.0.0.1", port, 16);

        let manager = StreamManager::new(config, Duration::from_millis(50));
        let start = std::time::Instant::now();
        let outcomes = manager.run(vec![path.clone()]).await;
        let _ = std::fs::remove_file(&path);

        assert!(matches!(outcomes[0].status, StreamStatus::TimedOut));
        assert!(!outcomes[0].is_success());
        assert_eq!(outcomes[0].elapsed, Duration::from_millis(50));
        // The deadline only cancels that run
        assert!(!manager.cancel_token().is_cancelled());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_external_cancel_stops_streams() {
        let socket = create_recv_socket(0, SocketOptions::default()).unwrap();
        let port = socket.local_addr().unwrap().port();
        let path = temp_file(1024);

        let manager = StreamManager::new(
            SenderConfig::new("127.0.0.1", port, 16),
            Duration::from_secs(10),
        );
        manager.cancel_token().cancel();
        let outcomes = manager.run(vec![path.clone()]).await;
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            outcomes[0].status,
            StreamStatus::Failed(StreamError::Cancelled { sequence: 1 })
        ));
    }

    #[test]
    fn test_cancelled_after_deadline_counts_as_timed_out() {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(50);
        let joined = Some(Ok((
            Duration::from_millis(70),
            Err(StreamError::Cancelled { sequence: 12 }),
        )));

        let (elapsed, status) = settle(joined, started, deadline, started + Duration::from_millis(80));
        assert!(matches!(status, StreamStatus::TimedOut));
        assert_eq!(elapsed, Duration::from_millis(50));
    }

    #[test]
    fn test_cancelled_before_deadline_is_a_failure() {
        let started = Instant::now();
        let deadline = started + Duration::from_secs(10);
        let joined = Some(Ok((
            Duration::from_millis(3),
            Err(StreamError::Cancelled { sequence: 1 }),
        )));

        let (elapsed, status) = settle(joined, started, deadline, started + Duration::from_millis(5));
        assert!(matches!(
            status,
            StreamStatus::Failed(StreamError::Cancelled { sequence: 1 })
        ));
        assert_eq!(elapsed, Duration::from_millis(3));
    }

    #[tokio::test]
    async fn test_crash_elapsed_is_time_since_start() {
        let join_err = tokio::spawn(async { panic!("decoder blew up") })
            .await
            .unwrap_err();

        let started = Instant::now();
        let deadline = started + Duration::from_secs(10);
        let now = started + Duration::from_millis(120);

        let (elapsed, status) = settle(Some(Err(join_err)), started, deadline, now);
        assert!(matches!(status, StreamStatus::Crashed(_)));
        assert_eq!(elapsed, Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_empty_run() {
        let manager = StreamManager::from_config(&AppConfig::default());
        assert!(manager.run(Vec::new()).await.is_empty());
    }
}

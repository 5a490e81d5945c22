//! Byte-rate governor
//!
//! A coarse throttle: before each send, the bytes sent so far are divided by
//! the (fractional) milliseconds since the previous send, taken from a
//! monotonic clock. If that rate is above the
//! ceiling, the sender pauses for a fixed delay. This is not a token bucket;
//! short bursts pass and sustained overrun keeps triggering the delay.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::constants::{DEFAULT_MAX_BYTES_PER_MS, DEFAULT_THROTTLE_DELAY_MS};

/// Outcome of one governor check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    /// Send immediately
    Clear,
    /// The caller was paused for the throttle delay
    Delayed,
}

/// The wait was interrupted by the cancellation token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

#[derive(Debug, Clone)]
pub struct RateGovernor {
    max_bytes_per_ms: f64,
    throttle_delay: Duration,
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_BYTES_PER_MS,
            Duration::from_millis(DEFAULT_THROTTLE_DELAY_MS),
        )
    }
}

impl RateGovernor {
    pub fn new(max_bytes_per_ms: f64, throttle_delay: Duration) -> Self {
        Self {
            max_bytes_per_ms,
            throttle_delay,
        }
    }

    pub fn max_bytes_per_ms(&self) -> f64 {
        self.max_bytes_per_ms
    }

    pub fn throttle_delay(&self) -> Duration {
        self.throttle_delay
    }

    /// Current rate in bytes/ms, or `None` on the first packet or when no
    /// time has passed since the last send
    pub fn rate(bytes_sent: u64, elapsed: Duration) -> Option<f64> {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if bytes_sent > 0 && elapsed_ms > 0.0 {
            Some(bytes_sent as f64 / elapsed_ms)
        } else {
            None
        }
    }

    /// Whether the next send has to wait
    pub fn must_throttle(&self, bytes_sent: u64, elapsed: Duration) -> bool {
        Self::rate(bytes_sent, elapsed).is_some_and(|rate| rate > self.max_bytes_per_ms)
    }

    /// Pause for the throttle delay if the ceiling is exceeded.
    ///
    /// `elapsed` is the time since the previous send. The pause races against
    /// `cancel`, so a shutdown unblocks it at once.
    pub async fn check(
        &self,
        bytes_sent: u64,
        elapsed: Duration,
        cancel: &CancellationToken,
    ) -> Result<Throttle, Cancelled> {
        if !self.must_throttle(bytes_sent, elapsed) {
            return Ok(Throttle::Clear);
        }

        tracing::debug!(
            bytes_sent,
            elapsed_us = elapsed.as_micros() as u64,
            delay_ms = self.throttle_delay.as_millis() as u64,
            "Byte rate above ceiling, throttling"
        );

        tokio::select! {
            _ = cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(self.throttle_delay) => Ok(Throttle::Delayed),
        }
    }
}

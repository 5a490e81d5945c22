//! Wire protocol definitions
//!
//! One frame travels as exactly one UDP datagram:
//!
//! ```text
//! <sequence:decimal>;<timestamp_ms:decimal>;<raw payload bytes>
//! ```
//!
//! There is no magic number, no checksum, no length prefix and no version
//! field. The payload boundary is found only by the position of the second
//! delimiter, so the header must stay plain ASCII digits.

use bytes::Bytes;

/// Separator between the header fields and between header and payload
pub const DELIMITER: u8 = b';';

/// Longest possible header: two `u64` values in decimal plus two delimiters
pub const MAX_HEADER_LEN: usize = 20 + 1 + 20 + 1;

/// Largest UDP payload over IPv4 (65535 - 8 byte UDP header - 20 byte IP header)
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Largest chunk size that is guaranteed to fit one datagram with any header
pub const MAX_CHUNK_SIZE: usize = MAX_DATAGRAM_SIZE - MAX_HEADER_LEN;

/// One logical packet: metadata plus a chunk of the byte source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Per-sender sequence number, starts at 1
    pub sequence: u64,
    /// Milliseconds since the Unix epoch, taken right before sending
    pub timestamp_ms: u64,
    /// Raw chunk bytes, possibly empty
    pub payload: Bytes,
}

impl Frame {
    pub fn new(sequence: u64, timestamp_ms: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            sequence,
            timestamp_ms,
            payload: payload.into(),
        }
    }

    /// Encode this frame into its wire bytes
    pub fn encode(&self) -> Bytes {
        crate::codec::encode(self.sequence, self.timestamp_ms, &self.payload)
    }

    /// Decode a frame from wire bytes
    pub fn decode(datagram: &[u8]) -> Result<Self, crate::error::FrameError> {
        crate::codec::decode(datagram)
    }

    /// Latency against a local arrival time, in milliseconds.
    ///
    /// Negative when the sender's clock runs ahead of the receiver's.
    pub fn latency_ms(&self, arrival_ms: u64) -> i64 {
        arrival_ms as i64 - self.timestamp_ms as i64
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

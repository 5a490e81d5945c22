//! Frame encoder
//!
//! Writes the ASCII header followed by the raw payload. Nothing is escaped
//! and nothing is truncated; callers size the payload so the result fits
//! one datagram.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::DELIMITER;

/// Encode a frame as `"{sequence};{timestamp_ms};"` immediately followed by `payload`
pub fn encode(sequence: u64, timestamp_ms: u64, payload: &[u8]) -> Bytes {
    let header = header(sequence, timestamp_ms);

    let mut out = BytesMut::with_capacity(header.len() + payload.len());
    out.put_slice(header.as_bytes());
    out.put_slice(payload);
    out.freeze()
}

/// Length of the header text for the given metadata
pub fn header_len(sequence: u64, timestamp_ms: u64) -> usize {
    header(sequence, timestamp_ms).len()
}

/// Total datagram length for the given metadata and payload length
pub fn encoded_len(sequence: u64, timestamp_ms: u64, payload_len: usize) -> usize {
    header_len(sequence, timestamp_ms) + payload_len
}

fn header(sequence: u64, timestamp_ms: u64) -> String {
    let delimiter = DELIMITER as char;
    format!("{sequence}{delimiter}{timestamp_ms}{delimiter}")
}

//! Frame decoder
//!
//! Recovers sequence and timestamp by scanning for the first two delimiters.
//! Everything after the second delimiter is the payload, returned as-is.

use bytes::Bytes;

use crate::error::FrameError;
use crate::protocol::{Frame, DELIMITER};

/// Decode one datagram into a [`Frame`]
pub fn decode(datagram: &[u8]) -> Result<Frame, FrameError> {
    let (sequence, timestamp_ms, payload) = split(datagram)?;

    Ok(Frame {
        sequence,
        timestamp_ms,
        payload: Bytes::copy_from_slice(payload),
    })
}

/// Split a datagram into parsed metadata and a borrowed payload slice
pub fn split(datagram: &[u8]) -> Result<(u64, u64, &[u8]), FrameError> {
    let first = datagram
        .iter()
        .position(|&b| b == DELIMITER)
        .ok_or(FrameError::MissingSequenceDelimiter)?;

    let rest = &datagram[first + 1..];
    let second = rest
        .iter()
        .position(|&b| b == DELIMITER)
        .ok_or(FrameError::MissingTimestampDelimiter)?;

    let sequence = parse_field(&datagram[..first]).ok_or_else(|| {
        FrameError::InvalidSequence(String::from_utf8_lossy(&datagram[..first]).into_owned())
    })?;
    let timestamp_ms = parse_field(&rest[..second]).ok_or_else(|| {
        FrameError::InvalidTimestamp(String::from_utf8_lossy(&rest[..second]).into_owned())
    })?;

    Ok((sequence, timestamp_ms, &rest[second + 1..]))
}

fn parse_field(field: &[u8]) -> Option<u64> {
    std::str::from_utf8(field).ok()?.parse().ok()
}

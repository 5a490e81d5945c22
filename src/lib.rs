//! # UDP Audio Streamer
//!
//! Streams audio files over UDP as a sequence of small framed datagrams,
//! paced against a maximum byte rate, and decodes them again on the
//! receiving side.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              SENDER                                  │
//! │   ┌───────────┐      ┌───────────┐      ┌───────────┐                │
//! │   │ track1.wav│      │ track2.wav│      │ track3.wav│   ...          │
//! │   └─────┬─────┘      └─────┬─────┘      └─────┬─────┘                │
//! │         ▼                  ▼                  ▼                      │
//! │   ┌─────────────────────────────────────────────────────────────┐    │
//! │   │               Stream Manager (streams::manager)             │    │
//! │   │      one task per file, one overall deadline                │    │
//! │   └─────┬──────────────────┬──────────────────┬─────────────────┘    │
//! │         ▼                  ▼                  ▼                      │
//! │   ┌───────────┐      ┌───────────┐      ┌───────────┐                │
//! │   │  Stream   │      │  Stream   │      │  Stream   │                │
//! │   │  Sender   │      │  Sender   │      │  Sender   │                │
//! │   │ chunk ──► │      │ chunk ──► │      │ chunk ──► │                │
//! │   │ governor  │      │ governor  │      │ governor  │                │
//! │   │ encode    │      │ encode    │      │ encode    │                │
//! │   └─────┬─────┘      └─────┬─────┘      └─────┬─────┘                │
//! │         │  own socket      │  own socket      │  own socket          │
//! └─────────┼──────────────────┼──────────────────┼──────────────────────┘
//!           │   UDP: <seq>;<timestamp_ms>;<raw bytes>
//!           ▼                  ▼                  ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                             RECEIVER                                 │
//! │   ┌─────────────────────────────────────────────────────────────┐    │
//! │   │          Stream Receiver (network::receiver)                │    │
//! │   │   recv ──► decode ──► latency = arrival - timestamp         │    │
//! │   └─────────────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Limitations
//!
//! The wire format has no length prefix. The decoder finds the payload by
//! scanning for the first two `;` bytes and hands back everything after the
//! second one untouched. The format offers no loss detection, reordering,
//! retransmission, integrity check or encryption.

pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod streams;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default destination host
    pub const DEFAULT_HOST: &str = "127.0.0.1";

    /// Default UDP port for audio streaming
    pub const DEFAULT_UDP_PORT: u16 = 7000;

    /// Default bytes read per datagram
    pub const DEFAULT_CHUNK_SIZE: usize = 1024;

    /// Default byte-rate ceiling in bytes per millisecond
    pub const DEFAULT_MAX_BYTES_PER_MS: f64 = 200_000.0;

    /// Default pause when the ceiling is exceeded
    pub const DEFAULT_THROTTLE_DELAY_MS: u64 = 20;

    /// Default directory searched for audio files
    pub const DEFAULT_SOURCE_DIR: &str = "./audio";

    /// Default audio file extension
    pub const DEFAULT_EXTENSION: &str = "wav";

    /// Default deadline for a multi-file run
    pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 15;
}

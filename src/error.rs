//! Error types for the audio streaming application

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Receive error: {0}")]
    Receive(#[from] ReceiveError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sender-side errors. Every variant is fatal to the stream that raised it
/// and to nothing else.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Could not create socket: {0}")]
    ChannelUnavailable(#[source] std::io::Error),

    #[error("Could not resolve host '{host}'")]
    AddressUnresolvable {
        host: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Could not read source '{}'", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream aborted at sequence {sequence}")]
    StreamAborted {
        sequence: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream cancelled at sequence {sequence}")]
    Cancelled { sequence: u64 },

    #[error("Invalid sender configuration: {0}")]
    InvalidConfig(String),
}

/// Wire decoding failures. All of these are the malformed-frame condition;
/// the variant says which part of the header was bad.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Malformed frame: could not parse 'sequence' delimiter")]
    MissingSequenceDelimiter,

    #[error("Malformed frame: could not parse 'timestamp' delimiter")]
    MissingTimestampDelimiter,

    #[error("Malformed frame: invalid sequence '{0}'")]
    InvalidSequence(String),

    #[error("Malformed frame: invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Receiver-side errors
#[derive(Error, Debug)]
pub enum ReceiveError {
    #[error("Socket bind failed on port {port}: {source}")]
    ChannelUnavailable {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("No datagram received within {0:?}")]
    ReceiveTimeout(Duration),

    #[error("Receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

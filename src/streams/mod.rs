//! Multi-stream runs
//!
//! Finds sources on disk and streams each one from its own task with its
//! own [`StreamSender`](crate::network::StreamSender).

pub mod manager;
pub mod sources;

pub use manager::{StreamManager, StreamOutcome, StreamStatus};
pub use sources::discover_sources;

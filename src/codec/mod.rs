//! Frame codec
//!
//! Stateless conversion between [`Frame`](crate::protocol::Frame) metadata
//! plus payload and the text-delimited wire bytes.

pub mod encoder;
pub mod decoder;

pub use encoder::{encode, encoded_len, header_len};
pub use decoder::{decode, split};

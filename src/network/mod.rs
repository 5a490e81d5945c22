//! Network subsystem for UDP audio transport

pub mod udp;
pub mod governor;
pub mod sender;
pub mod receiver;

pub use udp::{UdpSocket, create_socket};
pub use governor::RateGovernor;
pub use sender::{StreamSender, StreamReport};
pub use receiver::{StreamReceiver, ReceivedFrame};

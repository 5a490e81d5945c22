//! UDP socket construction
//!
//! Sockets are built with `socket2` so kernel buffer sizes can be set before
//! the socket is handed to tokio.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

pub use tokio::net::UdpSocket;

/// Socket tuning options
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketOptions {
    pub send_buffer_size: Option<usize>,
    pub recv_buffer_size: Option<usize>,
    pub reuse_address: bool,
}

/// Create a non-blocking tokio UDP socket bound to `bind_addr`
pub fn create_socket(bind_addr: SocketAddr, options: SocketOptions) -> io::Result<UdpSocket> {
    let domain = if bind_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if options.reuse_address {
        socket.set_reuse_address(true)?;
    }
    if let Some(size) = options.send_buffer_size {
        socket.set_send_buffer_size(size)?;
    }
    if let Some(size) = options.recv_buffer_size {
        socket.set_recv_buffer_size(size)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&bind_addr.into())?;

    UdpSocket::from_std(socket.into())
}

/// Outbound socket on an ephemeral local port, matching the address family
/// of `dest`
pub fn create_send_socket(dest: SocketAddr, options: SocketOptions) -> io::Result<UdpSocket> {
    let bind_addr = if dest.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };
    create_socket(bind_addr, options)
}

/// Inbound socket listening on `port` on all IPv4 interfaces
pub fn create_recv_socket(port: u16, options: SocketOptions) -> io::Result<UdpSocket> {
    create_socket(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), options)
}

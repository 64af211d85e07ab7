//! Internal utilities.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{SystemTime, UNIX_EPOCH};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Create and bind a UDP socket with optional receive buffer size.
pub(crate) fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if let Some(size) = recv_buffer_size {
        // Kernel caps this at rmem_max; a smaller buffer is still usable
        let _ = socket.set_recv_buffer_size(size);
    }

    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}

/// Bind an ephemeral-port socket in the address family of `target`.
pub(crate) fn bind_ephemeral_udp_socket(
    target: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let local = if target.is_ipv6() {
        SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0)
    } else {
        SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0)
    };
    bind_udp_socket(local, recv_buffer_size)
}

/// Generate a request ID: random, positive, 31 bits.
///
/// Uniqueness is not tracked. The reply is read directly off a socket owned
/// by one session, so the ID only has to tell this reply from a stale one.
pub(crate) fn random_request_id() -> i32 {
    let mut buf = [0u8; 4];
    let raw = match getrandom::fill(&mut buf) {
        Ok(()) => u32::from_ne_bytes(buf),
        // OS entropy unavailable; fall back to the clock
        Err(_) => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(1),
    };
    ((raw & 0x7FFF_FFFF) as i32).max(1)
}

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

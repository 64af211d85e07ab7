//! Transport layer abstraction.
//!
//! Provides the `Transport` trait, the owned UDP implementation used by
//! sessions, and a scripted mock for tests.

mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use udp::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

/// Size of the receive buffer. Replies larger than this are truncated by
/// the kernel and will fail to decode.
pub const RECV_BUFFER_SIZE: usize = 16 * 1024;

/// Client-side transport abstraction.
///
/// A transport is bound to exactly one peer. Both directions take a deadline;
/// failures are reported as [`Error::Timeout`](crate::Error::Timeout) or
/// [`Error::Io`](crate::Error::Io), which the session retries.
pub trait Transport: Send + Sync {
    /// Send a full request datagram, failing if it cannot be written in time.
    fn send(&self, data: &[u8], timeout: Duration) -> impl Future<Output = Result<()>> + Send;

    /// Receive one reply datagram, failing if none arrives in time.
    fn recv(&self, timeout: Duration) -> impl Future<Output = Result<Bytes>> + Send;

    /// The peer address for this transport.
    fn peer_addr(&self) -> SocketAddr;
}

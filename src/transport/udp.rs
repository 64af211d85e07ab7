//! UDP transport implementation.

use super::{RECV_BUFFER_SIZE, Transport};
use crate::error::{Error, Result};
use crate::util::bind_ephemeral_udp_socket;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// UDP transport for a single target.
///
/// Owns a connected socket on an ephemeral port. The socket is released when
/// the transport is dropped.
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind an ephemeral socket and connect it to `target`.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        tracing::debug!(target: "snmp_flow::session", { snmp.target = %target }, "connecting UDP transport");

        let io_err = |source| Error::Io {
            target: Some(target),
            source,
        };

        let socket = bind_ephemeral_udp_socket(target, Some(RECV_BUFFER_SIZE)).map_err(io_err)?;
        socket.connect(target).await.map_err(io_err)?;
        let local_addr = socket.local_addr().map_err(io_err)?;

        tracing::debug!(
            target: "snmp_flow::session",
            { snmp.target = %target, snmp.local_addr = %local_addr },
            "UDP transport connected"
        );

        Ok(Self {
            socket,
            target,
            local_addr,
        })
    }

    /// Local bind address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn timeout_error(&self, elapsed: Duration) -> Error {
        Error::Timeout {
            target: Some(self.target),
            elapsed,
            retries: 0,
        }
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8], send_timeout: Duration) -> Result<()> {
        tracing::trace!(
            target: "snmp_flow::session",
            { snmp.target = %self.target, snmp.bytes = data.len() },
            "UDP send"
        );

        match timeout(send_timeout, self.socket.send(data)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::Io {
                target: Some(self.target),
                source: e,
            }),
            Err(_) => Err(self.timeout_error(send_timeout)),
        }
    }

    async fn recv(&self, recv_timeout: Duration) -> Result<Bytes> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];

        match timeout(recv_timeout, self.socket.recv(&mut buf)).await {
            Ok(Ok(len)) => {
                buf.truncate(len);
                tracing::trace!(
                    target: "snmp_flow::session",
                    { snmp.target = %self.target, snmp.bytes = len },
                    "UDP recv complete"
                );
                Ok(Bytes::from(buf))
            }
            Ok(Err(e)) => Err(Error::Io {
                target: Some(self.target),
                source: e,
            }),
            Err(_) => Err(self.timeout_error(recv_timeout)),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_recv_echo() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let transport = UdpTransport::connect(peer_addr).await.unwrap();
        assert_eq!(transport.peer_addr(), peer_addr);

        transport
            .send(b"ping", Duration::from_secs(1))
            .await
            .unwrap();

        let mut buf = [0u8; 16];
        let (len, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ping");
        peer.send_to(b"pong", from).await.unwrap();

        let reply = transport.recv(Duration::from_secs(1)).await.unwrap();
        assert_eq!(&reply[..], b"pong");
    }

    #[tokio::test]
    async fn test_recv_timeout() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let transport = UdpTransport::connect(peer.local_addr().unwrap())
            .await
            .unwrap();

        let err = transport.recv(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(err.is_retryable());
    }
}

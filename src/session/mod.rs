//! SNMP session.
//!
//! A [`Session`] owns one transport bound to one agent and one community.
//! It is created for a single logical poll and released when the caller is
//! done with it; sessions are never shared between hosts.
//!
//! Operations live in `ops` (Get/GetNext/GetBulk/Set) and `walk` (subtree
//! enumeration). Both funnel through [`Session::request`], the only place a
//! datagram is sent, which owns the retry budget.

mod builder;
mod ops;
mod walk;

pub use builder::SessionBuilder;
pub use ops::ValueMap;

use crate::error::{Error, Result};
use crate::message::{Message, Pdu};
use crate::transport::{Transport, UdpTransport};
use crate::util::random_request_id;
use crate::value::PduKind;
use crate::version::Version;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{Span, instrument};

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default retry count (attempts = retries + 1).
pub const DEFAULT_RETRIES: u32 = 3;

/// Default max-repetitions for GetBulk and batch size for walks.
pub const DEFAULT_MAX_REPETITIONS: i32 = 50;

/// Session configuration.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// SNMP version (default: V2c)
    pub version: Version,
    /// Community string (default: "public")
    pub community: Bytes,
    /// Deadline for each send and each receive (default: 5 seconds)
    pub timeout: Duration,
    /// Extra attempts after the first one fails (default: 3)
    pub retries: u32,
    /// GetBulk max-repetitions used by walks (default: 50)
    pub max_repetitions: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
        }
    }
}

/// SNMP session bound to a single agent.
///
/// Dropping the session (or calling [`close`](Session::close)) releases the
/// socket, so every exit path of the owning task cleans up.
pub struct Session<T: Transport = UdpTransport> {
    transport: T,
    config: SessionConfig,
}

impl Session<UdpTransport> {
    /// Start building a session for `target` (`host` or `host:port`).
    ///
    /// ```rust,no_run
    /// # use std::time::Duration;
    /// # async fn example() -> snmp_flow::Result<()> {
    /// let session = snmp_flow::Session::builder("192.168.1.1")
    ///     .community("public")
    ///     .timeout(Duration::from_millis(500))
    ///     .retries(1)
    ///     .connect()
    ///     .await?;
    /// let uptime = session.get(&snmp_flow::oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)).await?;
    /// println!("{}", uptime);
    /// session.close();
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder(target: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(target)
    }
}

impl<T: Transport> Session<T> {
    /// Create a session over an existing transport.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self { transport, config }
    }

    /// The agent address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.transport.peer_addr()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Release the socket.
    pub fn close(self) {
        tracing::debug!(target: "snmp_flow::session", { snmp.target = %self.peer_addr() }, "session closed");
    }

    /// Send one encoded request and return the raw reply.
    ///
    /// Makes up to `retries + 1` attempts. Each attempt writes the whole
    /// datagram under the timeout, then waits for one reply under the same
    /// timeout. Transport failures and timeouts consume an attempt; there is
    /// no backoff between attempts. After the last attempt the last error is
    /// returned.
    pub async fn request(&self, data: &[u8]) -> Result<Bytes> {
        self.send_and_recv(data, |reply| Ok(Some(reply))).await
    }

    /// Retry loop shared by [`request`](Self::request) and `exchange`.
    ///
    /// `accept` sees every datagram read during an attempt. `Ok(None)` drops
    /// the datagram and keeps reading until the attempt deadline; an error
    /// ends the request without further attempts.
    #[instrument(
        level = "debug",
        skip_all,
        fields(
            snmp.target = %self.peer_addr(),
            snmp.attempt = tracing::field::Empty,
            snmp.elapsed_ms = tracing::field::Empty,
        )
    )]
    async fn send_and_recv<R, F>(&self, data: &[u8], accept: F) -> Result<R>
    where
        F: Fn(Bytes) -> Result<Option<R>>,
    {
        let start = Instant::now();
        let retries = self.config.retries;
        let mut last_error = None;

        for attempt in 0..=retries {
            Span::current().record("snmp.attempt", attempt);
            if attempt > 0 {
                tracing::debug!(target: "snmp_flow::session", "retrying request");
            }

            match self.attempt(data, &accept).await {
                Ok(reply) => {
                    Span::current().record("snmp.elapsed_ms", start.elapsed().as_millis() as u64);
                    return Ok(reply);
                }
                Err(e) if e.is_retryable() => {
                    tracing::debug!(target: "snmp_flow::session", { snmp.attempt = attempt, error = %e }, "attempt failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        let elapsed = start.elapsed();
        Span::current().record("snmp.elapsed_ms", elapsed.as_millis() as u64);
        tracing::debug!(target: "snmp_flow::session", { ?elapsed, retries }, "request failed after all attempts");

        Err(match last_error {
            Some(Error::Timeout { target, elapsed, .. }) => Error::Timeout {
                target,
                elapsed,
                retries,
            },
            Some(e) => e,
            None => Error::Timeout {
                target: Some(self.peer_addr()),
                elapsed,
                retries,
            },
        })
    }

    /// One send followed by reads until `accept` takes a datagram or the
    /// timeout runs out.
    async fn attempt<R, F>(&self, data: &[u8], accept: &F) -> Result<R>
    where
        F: Fn(Bytes) -> Result<Option<R>>,
    {
        let timeout = self.config.timeout;
        self.transport.send(data, timeout).await?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout {
                    target: Some(self.peer_addr()),
                    elapsed: timeout,
                    retries: 0,
                });
            }

            let reply = self.transport.recv(remaining).await?;
            tracing::trace!(target: "snmp_flow::session", { snmp.bytes = reply.len() }, "received reply");
            if let Some(accepted) = accept(reply)? {
                return Ok(accepted);
            }
        }
    }

    /// Encode `pdu`, send it and validate the reply.
    ///
    /// Datagrams that are not a Response carrying this request-id (late
    /// replies to an earlier attempt or request) are dropped while the
    /// attempt waits. The accepted reply must have a zero error-status.
    #[instrument(
        level = "debug",
        skip(self, pdu),
        fields(
            snmp.target = %self.peer_addr(),
            snmp.request_id = pdu.request_id,
            snmp.pdu_type = %pdu.kind,
        )
    )]
    pub(crate) async fn exchange(&self, pdu: Pdu) -> Result<Pdu> {
        let request_id = pdu.request_id;
        let target = self.peer_addr();
        let data = Message::new(self.config.version, self.config.community.clone(), pdu).encode()?;

        let response = self
            .send_and_recv(&data, |reply| {
                let response = Message::decode(reply)
                    .map_err(|e| e.with_target(target))?
                    .into_pdu();
                if response.kind != PduKind::GetResponse || response.request_id != request_id {
                    tracing::debug!(
                        target: "snmp_flow::session",
                        { expected = request_id, actual = response.request_id, snmp.pdu_type = %response.kind },
                        "dropping stale reply"
                    );
                    return Ok(None);
                }
                Ok(Some(response))
            })
            .await?;

        if response.is_error() {
            // error_index is 1-based; 0 means the error applies to the whole PDU
            let oid = (response.error_index as usize)
                .checked_sub(1)
                .and_then(|idx| response.varbinds.get(idx))
                .map(|vb| vb.oid.clone());
            return Err(Error::Snmp {
                target: Some(target),
                status: response.status(),
                index: response.error_index.max(0) as u32,
                oid,
            });
        }

        tracing::debug!(target: "snmp_flow::session", { snmp.varbind_count = response.varbinds.len() }, "received response");
        Ok(response)
    }

    fn next_request_id(&self) -> i32 {
        random_request_id()
    }
}

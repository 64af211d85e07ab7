//! Session builder.
//!
//! ```rust,no_run
//! # use snmp_flow::Session;
//! # use std::time::Duration;
//! # async fn example() -> snmp_flow::Result<()> {
//! let session = Session::builder("10.0.0.1")
//!     .community("public")
//!     .timeout(Duration::from_secs(2))
//!     .retries(3)
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::transport::{Transport, UdpTransport};
use crate::version::Version;

use super::{Session, SessionConfig};

/// Port used when the target does not name one.
pub const DEFAULT_PORT: u16 = 161;

/// Builder for [`Session`].
///
/// Created via [`Session::builder()`].
pub struct SessionBuilder {
    target: String,
    config: SessionConfig,
}

impl SessionBuilder {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            config: SessionConfig::default(),
        }
    }

    /// Set the community string.
    pub fn community(mut self, community: impl Into<Bytes>) -> Self {
        self.config.community = community.into();
        self
    }

    /// Set the SNMP version.
    pub fn version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of retries after the first attempt.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set GetBulk max-repetitions used by walks.
    pub fn max_repetitions(mut self, max_repetitions: i32) -> Self {
        self.config.max_repetitions = max_repetitions;
        self
    }

    /// Resolve the target, open a UDP socket and return the session.
    pub async fn connect(self) -> Result<Session<UdpTransport>> {
        let addr = resolve_target(&self.target).await?;
        let transport = UdpTransport::connect(addr).await?;
        Ok(Session::new(transport, self.config))
    }

    /// Build a session over a caller-supplied transport.
    pub fn build<T: Transport>(self, transport: T) -> Session<T> {
        Session::new(transport, self.config)
    }
}

/// Normalize `target` to `host:port`, adding port 161 when absent.
///
/// Bare IPv6 literals (`::1`) are treated as hosts without a port.
pub(crate) fn with_default_port(target: &str) -> String {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_PORT).to_string();
    }
    if target.parse::<SocketAddr>().is_ok() {
        return target.to_string();
    }
    match target.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => {
            target.to_string()
        }
        _ => format!("{}:{}", target, DEFAULT_PORT),
    }
}

async fn resolve_target(target: &str) -> Result<SocketAddr> {
    let normalized = with_default_port(target);
    let io_err = |source| Error::Io {
        target: None,
        source,
    };

    tokio::net::lookup_host(normalized.as_str())
        .await
        .map_err(io_err)?
        .next()
        .ok_or_else(|| {
            io_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("could not resolve address {}", target),
            ))
        })
}

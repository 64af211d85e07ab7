// Allow large error types - the Error enum carries OIDs and addresses inline.
#![allow(clippy::result_large_err)]

//! # snmp-flow
//!
//! SNMPv2c client and switch traffic poller.
//!
//! ## Features
//!
//! - From-scratch BER codec over a recursive [`AsnValue`] tree
//! - Async sessions on Tokio with a fixed per-attempt timeout and retry budget
//! - Get, GetNext, GetBulk, Set and GetBulk-driven subtree walks
//! - A bounded concurrent poller that reports per-port in/out octets (feature `poller`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_flow::{Session, oid};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), snmp_flow::Error> {
//!     let session = Session::builder("192.168.1.1")
//!         .community("public")
//!         .timeout(Duration::from_millis(500))
//!         .connect()
//!         .await?;
//!
//!     let in_octets = session.walk(&oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6)).await?;
//!     for (oid, value) in &in_octets {
//!         println!("{} = {}", oid, value);
//!     }
//!
//!     session.close();
//!     Ok(())
//! }
//! ```

pub mod ber;
pub mod error;
pub mod message;
pub mod oid;
pub mod prelude;
pub mod session;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

#[cfg(feature = "poller")]
pub mod poll;

#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use error::{
    DecodeErrorKind, EncodeErrorKind, Error, ErrorStatus, OidErrorKind, ProtocolErrorKind, Result,
};
pub use message::{Message, Pdu};
pub use oid::Oid;
pub use session::{Session, SessionBuilder, SessionConfig, ValueMap};
pub use transport::{Transport, UdpTransport};
pub use value::{AsnValue, PduKind};
pub use varbind::VarBind;
pub use version::Version;

//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use snmp_flow::prelude::*;
//! ```
//!
//! This imports:
//! - Core types: [`Session`], [`Oid`], [`AsnValue`], [`VarBind`]
//! - Error handling: [`Error`], [`Result`]
//! - The [`oid!`] macro for compile-time OID construction

pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::session::{Session, SessionConfig};
pub use crate::value::AsnValue;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;

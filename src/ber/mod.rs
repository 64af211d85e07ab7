//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Encoding and decoding of BER primitives as used in SNMP. Decoding is
//! permissive about non-minimal integers and lengths, strict about truncation.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;

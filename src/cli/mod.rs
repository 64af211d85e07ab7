//! Command-line front end for the `snmp-flow` poller.
//!
//! This module is only available with the `cli` feature.

pub mod args;

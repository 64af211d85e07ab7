//! Shared test utilities for snmp-flow integration tests.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

mod agent;
mod fixtures;

pub use agent::TestAgent;
pub use fixtures::*;

/// Route library logs to the test harness; filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

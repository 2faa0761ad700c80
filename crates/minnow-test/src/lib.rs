//! # minnow-test
//!
//! Integration tests for MinnowDB.
//!
//! This crate contains:
//! - End-to-end tests over real heap files (`tests/`)
//! - Shared fixtures for building tables and draining operators

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Test utilities and helpers
pub mod utils;

/// Installs a global `tracing` subscriber once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

//! Logging utilities
//!
//! Provides logging setup for the gateway binary.

use env_logger::Env;

/// Setup logging for the gateway
///
/// Honours `RUST_LOG`, defaulting to `info` so refusals and completed
/// writes are visible without extra setup.
pub fn setup_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

//! Storage gateway
//!
//! The entry point the host calls with each output event.

pub mod core;

pub use self::core::{DEFAULT_LOCK_TIMEOUT, StorageGateway};

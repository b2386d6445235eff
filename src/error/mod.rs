//! Error handling
//!
//! Defines error types and reporting for the storage gateway.

pub mod handlers;
pub mod types;

pub use types::*;

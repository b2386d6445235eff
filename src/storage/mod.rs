//! File system storage management
//!
//! Handles path confinement and the create/write/delete operations.

pub mod filesystem;
pub mod operations;
pub mod validation;

pub use operations::{WriteMode, dispatch};
pub use validation::confine;

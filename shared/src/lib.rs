//! Task App Shared Library
//!
//! This crate contains the wire types, error types and input validation
//! shared by the backend and its tests.

pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use types::*;

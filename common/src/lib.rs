//! Common Utilities and Types Library
//!
//! This crate provides shared radio types and unit helpers used by the throughput estimator.

pub mod types;
pub mod utils;

// Re-export commonly used items
pub use types::*;
pub use utils::*;

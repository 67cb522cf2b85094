//! Medium Access Control (MAC) Layer
//!
//! Throughput seen above the MAC for a scheduled transport block, 3GPP TS 38.321

pub mod throughput;

pub use throughput::{ThroughputConfig, ThroughputResult, DEFAULT_PRB_OVERHEAD};

//! Protocol Stack Layers Library
//!
//! This crate implements the downlink throughput estimate of a 5G NR link,
//! split along the PHY and MAC layers according to 3GPP TS 38.214.

pub mod phy;
pub mod mac;
pub mod pipeline;

use common::RatioParseError;
use thiserror::Error;

pub use pipeline::{evaluate, information_bits_per_slot, LookupWarning, PipelineResult, RadioConfig};
pub use phy::link_budget::{LinkBudgetInputs, LinkBudgetResult};

/// Common errors for protocol layers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Undefined operation: {0}")]
    UndefinedOperation(String),
}

impl From<RatioParseError> for LayerError {
    fn from(err: RatioParseError) -> Self {
        LayerError::InvalidInput(err.to_string())
    }
}

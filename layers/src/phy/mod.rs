//! Physical Layer (PHY) Submodules
//!
//! Link budget, channel quality quantization, resource element accounting
//! and transport block sizing according to 3GPP TS 38.214.

pub mod link_budget;
pub mod capacity;
pub mod cqi;
pub mod mcs;
pub mod resource_elements;
pub mod tbs;

// Re-export commonly used types
pub use link_budget::{LinkBudgetInputs, LinkBudgetResult};
pub use cqi::{select_cqi, CqiEntry, CQI_TABLE};
pub use mcs::{mcs_by_index, select_mcs, McsEntry, MCS_TABLE};
pub use resource_elements::{ReAllocation, MAX_RES_PER_PRB};
pub use tbs::{determine_tbs, TbsDetermination, TBS_TABLE};

use serde::Serialize;

/// Result of a table lookup that may have been clamped to the table boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableLookup<T> {
    /// Selected value
    pub value: T,
    /// True when no entry satisfied the search and the boundary entry was used
    pub clamped: bool,
}

impl<T> TableLookup<T> {
    pub(crate) fn exact(value: T) -> Self {
        Self { value, clamped: false }
    }

    pub(crate) fn clamped(value: T) -> Self {
        Self { value, clamped: true }
    }
}

/// Floor selection: the entry with the largest key not exceeding `target`.
///
/// Falls back to the entry with the smallest key when every key exceeds the
/// target. Does not rely on the table order. `None` only for an empty table.
pub(crate) fn floor_select<T, F>(table: &[T], target: f64, key: F) -> Option<TableLookup<&T>>
where
    F: Fn(&T) -> f64,
{
    let floor = table
        .iter()
        .filter(|entry| key(entry) <= target)
        .max_by(|a, b| key(a).total_cmp(&key(b)));

    match floor {
        Some(entry) => Some(TableLookup::exact(entry)),
        None => table
            .iter()
            .min_by(|a, b| key(a).total_cmp(&key(b)))
            .map(TableLookup::clamped),
    }
}

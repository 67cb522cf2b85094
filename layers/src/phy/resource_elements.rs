//! PDSCH Resource Element accounting
//!
//! Number of REs available for data per PRB and per allocation,
//! following 3GPP TS 38.214 Section 5.1.3.2

use common::{SUBCARRIERS_PER_RB, SYMBOLS_PER_SLOT};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on REs assumed per PRB
pub const MAX_RES_PER_PRB: i64 = 156;

/// PDSCH allocation for one UE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReAllocation {
    /// Subcarriers per resource block
    pub subcarriers_per_rb: u32,
    /// PDSCH symbols in the slot
    pub symbols_per_slot: u32,
    /// DMRS REs per PRB
    pub dmrs_res_per_prb: u32,
    /// Higher-layer overhead REs per PRB (xOverhead)
    pub overhead_res_per_prb: u32,
    /// PRBs allocated to the UE
    pub num_prbs: u32,
}

impl Default for ReAllocation {
    fn default() -> Self {
        Self {
            subcarriers_per_rb: SUBCARRIERS_PER_RB,
            symbols_per_slot: SYMBOLS_PER_SLOT,
            dmrs_res_per_prb: 0,
            overhead_res_per_prb: 0,
            num_prbs: 1,
        }
    }
}

/// REs per PRB before the cap; negative when overheads exceed the grid
pub fn res_per_prb(subcarriers_per_rb: u32, symbols_per_slot: u32, dmrs_res: u32, overhead_res: u32) -> i64 {
    subcarriers_per_rb as i64 * symbols_per_slot as i64 - dmrs_res as i64 - overhead_res as i64
}

/// Apply the per-PRB cap
pub fn capped_res_per_prb(res_per_prb: i64) -> i64 {
    res_per_prb.min(MAX_RES_PER_PRB)
}

/// Total REs over the allocated PRBs
pub fn total_available_res(capped_res_per_prb: i64, num_prbs: u32) -> i64 {
    capped_res_per_prb * num_prbs as i64
}

impl ReAllocation {
    /// Capped REs per PRB
    pub fn res_per_prb(&self) -> i64 {
        capped_res_per_prb(res_per_prb(
            self.subcarriers_per_rb,
            self.symbols_per_slot,
            self.dmrs_res_per_prb,
            self.overhead_res_per_prb,
        ))
    }

    /// Total REs available to the UE; may be zero or negative for invalid allocations
    pub fn available_res(&self) -> i64 {
        let per_prb = self.res_per_prb();
        let total = total_available_res(per_prb, self.num_prbs);
        debug!("REs: {} per PRB x {} PRBs = {}", per_prb, self.num_prbs, total);
        total
    }
}

//! Modulation and Coding Scheme selection
//!
//! PDSCH MCS index table 2 per 3GPP TS 38.214 Table 5.1.3.1-2 (256QAM),
//! indices 0-27.

use std::fmt;

use common::ModulationScheme;
use serde::Serialize;
use tracing::{trace, warn};

use super::{floor_select, TableLookup};
use crate::LayerError;

/// One row of the MCS table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct McsEntry {
    /// MCS index (0-27)
    pub index: u8,
    /// Modulation scheme
    pub modulation: ModulationScheme,
    /// Target code rate x 1024
    pub code_rate_x1024: f64,
    /// Spectral efficiency in bits/s/Hz
    pub spectral_efficiency: f64,
}

impl McsEntry {
    /// Modulation order Qm
    pub fn modulation_order(&self) -> u8 {
        self.modulation.order()
    }

    /// Code rate R as a fraction
    pub fn code_rate(&self) -> f64 {
        self.code_rate_x1024 / 1024.0
    }
}

impl fmt::Display for McsEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MCS {} ({}, Qm={}, R={}/1024)",
            self.index,
            self.modulation,
            self.modulation_order(),
            self.code_rate_x1024
        )
    }
}

const fn mcs(index: u8, modulation: ModulationScheme, code_rate_x1024: f64, spectral_efficiency: f64) -> McsEntry {
    McsEntry { index, modulation, code_rate_x1024, spectral_efficiency }
}

use ModulationScheme::{Qam16, Qam256, Qam64, Qpsk};

/// MCS table, ascending by spectral efficiency
pub static MCS_TABLE: [McsEntry; 28] = [
    mcs(0, Qpsk, 120.0, 0.2344),
    mcs(1, Qpsk, 193.0, 0.3770),
    mcs(2, Qpsk, 308.0, 0.6016),
    mcs(3, Qpsk, 449.0, 0.8770),
    mcs(4, Qpsk, 602.0, 1.1758),
    mcs(5, Qam16, 378.0, 1.4766),
    mcs(6, Qam16, 434.0, 1.6953),
    mcs(7, Qam16, 490.0, 1.9141),
    mcs(8, Qam16, 553.0, 2.1602),
    mcs(9, Qam16, 616.0, 2.4063),
    mcs(10, Qam16, 658.0, 2.5703),
    mcs(11, Qam64, 466.0, 2.7305),
    mcs(12, Qam64, 517.0, 3.0293),
    mcs(13, Qam64, 567.0, 3.3223),
    mcs(14, Qam64, 616.0, 3.6094),
    mcs(15, Qam64, 666.0, 3.9023),
    mcs(16, Qam64, 719.0, 4.2129),
    mcs(17, Qam64, 772.0, 4.5234),
    mcs(18, Qam64, 822.0, 4.8164),
    mcs(19, Qam64, 873.0, 5.1152),
    mcs(20, Qam256, 682.5, 5.3320),
    mcs(21, Qam256, 711.0, 5.5547),
    mcs(22, Qam256, 754.0, 5.8906),
    mcs(23, Qam256, 797.0, 6.2266),
    mcs(24, Qam256, 841.0, 6.5703),
    mcs(25, Qam256, 885.0, 6.9141),
    mcs(26, Qam256, 916.5, 7.1602),
    mcs(27, Qam256, 948.0, 7.4063),
];

/// Highest MCS whose spectral efficiency does not exceed `spectral_efficiency`.
///
/// Efficiencies below MCS 0 (CQI 0 and 1) fall back to MCS 0, flagged as clamped.
pub fn select_mcs(spectral_efficiency: f64) -> TableLookup<&'static McsEntry> {
    let lookup = floor_select(&MCS_TABLE, spectral_efficiency, |e| e.spectral_efficiency)
        .unwrap_or(TableLookup::clamped(&MCS_TABLE[0]));

    if lookup.clamped {
        warn!("Spectral efficiency {} is below the MCS table, using {}",
              spectral_efficiency, lookup.value);
    } else {
        trace!("Spectral efficiency {} maps to {}", spectral_efficiency, lookup.value);
    }

    lookup
}

/// Direct lookup by MCS index
pub fn mcs_by_index(index: u8) -> Result<&'static McsEntry, LayerError> {
    MCS_TABLE
        .iter()
        .find(|entry| entry.index == index)
        .ok_or_else(|| LayerError::InvalidInput(format!(
            "MCS index {} outside 0..={}", index, MCS_TABLE.len() - 1
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phy::cqi::CQI_TABLE;

    #[test]
    fn test_table_shape() {
        assert_eq!(MCS_TABLE.len(), 28);
        for (i, pair) in MCS_TABLE.windows(2).enumerate() {
            assert_eq!(pair[0].index as usize, i);
            assert!(pair[0].spectral_efficiency < pair[1].spectral_efficiency);
        }
        for entry in &MCS_TABLE {
            assert!(entry.code_rate_x1024 > 0.0 && entry.code_rate_x1024 <= 1024.0);
        }
    }

    #[test]
    fn test_every_cqi_level_has_matching_mcs() {
        // Each non-zero CQI efficiency (except CQI 1) appears in the MCS table
        for cqi in &CQI_TABLE[2..] {
            let lookup = select_mcs(cqi.spectral_efficiency);
            assert!(!lookup.clamped);
            assert_eq!(lookup.value.spectral_efficiency, cqi.spectral_efficiency);
            assert_eq!(Some(lookup.value.modulation), cqi.modulation);
            assert_eq!(lookup.value.code_rate_x1024, cqi.code_rate_x1024 as f64);
        }
    }

    #[test]
    fn test_floor_selection() {
        let entry = select_mcs(3.0).value;
        assert_eq!(entry.index, 11);
        assert_eq!(entry.modulation_order(), 6);
        assert_eq!(entry.code_rate_x1024, 466.0);

        assert_eq!(select_mcs(7.4063).value.index, 27);
        assert_eq!(select_mcs(100.0).value.index, 27);
        assert_eq!(select_mcs(5.3320).value.code_rate_x1024, 682.5);
    }

    #[test]
    fn test_below_table_is_clamped() {
        for se in [0.0, 0.1523, 0.2343] {
            let lookup = select_mcs(se);
            assert!(lookup.clamped);
            assert_eq!(lookup.value.index, 0);
        }
        assert!(!select_mcs(0.2344).clamped);
    }

    #[test]
    fn test_mcs_by_index() {
        let entry = mcs_by_index(20).unwrap();
        assert_eq!(entry.modulation_order(), 8);
        assert_eq!(entry.code_rate_x1024, 682.5);
        assert!((entry.code_rate() - 682.5 / 1024.0).abs() < 1e-15);

        assert!(matches!(mcs_by_index(28), Err(LayerError::InvalidInput(_))));
    }
}

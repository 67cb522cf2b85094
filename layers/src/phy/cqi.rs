//! Channel Quality Indicator mapping
//!
//! 4-bit CQI table per 3GPP TS 38.214 Table 5.2.2.1-3 (256QAM)

use std::fmt;

use common::ModulationScheme;
use serde::Serialize;
use tracing::{trace, warn};

use super::{floor_select, TableLookup};

/// One row of the CQI table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CqiEntry {
    /// CQI index (0-15)
    pub index: u8,
    /// Modulation; `None` for the out-of-range row
    pub modulation: Option<ModulationScheme>,
    /// Code rate x 1024
    pub code_rate_x1024: u16,
    /// Spectral efficiency in bits/s/Hz
    pub spectral_efficiency: f64,
}

impl fmt::Display for CqiEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modulation {
            Some(modulation) => write!(
                f,
                "CQI {} ({}, R={}/1024, {:.4} b/s/Hz)",
                self.index, modulation, self.code_rate_x1024, self.spectral_efficiency
            ),
            None => write!(f, "CQI {} (out of range)", self.index),
        }
    }
}

const fn cqi(index: u8, modulation: Option<ModulationScheme>, code_rate_x1024: u16, spectral_efficiency: f64) -> CqiEntry {
    CqiEntry { index, modulation, code_rate_x1024, spectral_efficiency }
}

use ModulationScheme::{Qam16, Qam256, Qam64, Qpsk};

/// CQI table, ascending by spectral efficiency
pub static CQI_TABLE: [CqiEntry; 16] = [
    cqi(0, None, 0, 0.0),
    cqi(1, Some(Qpsk), 78, 0.1523),
    cqi(2, Some(Qpsk), 193, 0.3770),
    cqi(3, Some(Qpsk), 449, 0.8770),
    cqi(4, Some(Qam16), 378, 1.4766),
    cqi(5, Some(Qam16), 490, 1.9141),
    cqi(6, Some(Qam16), 616, 2.4063),
    cqi(7, Some(Qam64), 466, 2.7305),
    cqi(8, Some(Qam64), 567, 3.3223),
    cqi(9, Some(Qam64), 666, 3.9023),
    cqi(10, Some(Qam64), 772, 4.5234),
    cqi(11, Some(Qam64), 873, 5.1152),
    cqi(12, Some(Qam256), 711, 5.5547),
    cqi(13, Some(Qam256), 797, 6.2266),
    cqi(14, Some(Qam256), 885, 6.9141),
    cqi(15, Some(Qam256), 948, 7.4063),
];

/// Highest CQI whose spectral efficiency does not exceed `spectral_efficiency`.
///
/// Values below the first row select CQI 0 and are flagged as clamped.
pub fn select_cqi(spectral_efficiency: f64) -> TableLookup<&'static CqiEntry> {
    let lookup = floor_select(&CQI_TABLE, spectral_efficiency, |e| e.spectral_efficiency)
        .unwrap_or(TableLookup::clamped(&CQI_TABLE[0]));

    if lookup.clamped {
        warn!("Spectral efficiency {} is below the CQI table, using CQI {}",
              spectral_efficiency, lookup.value.index);
    } else {
        trace!("Spectral efficiency {} maps to {}", spectral_efficiency, lookup.value);
    }

    lookup
}

//! Common Utilities
//!
//! Unit conversions and grid helpers shared by the estimator stages

use tracing::trace;

use crate::types::SubcarrierSpacing;

/// Boltzmann constant in J/K
pub const BOLTZMANN_CONSTANT: f64 = 1.38e-23;

/// Each RB has 12 subcarriers
pub const SUBCARRIERS_PER_RB: u32 = 12;

/// OFDM symbols per slot with normal cyclic prefix
pub const SYMBOLS_PER_SLOT: u32 = 14;

/// Convert power in dBm to Watts
pub fn dbm_to_watts(dbm: f64) -> f64 {
    0.001 * 10f64.powf(dbm / 10.0)
}

/// Convert power in Watts to dBm
pub fn watts_to_dbm(watts: f64) -> f64 {
    10.0 * (watts * 1000.0).log10()
}

/// Calculate resource blocks from bandwidth and subcarrier spacing
pub fn calculate_nrb(bandwidth_hz: f64, scs: SubcarrierSpacing) -> u32 {
    if bandwidth_hz <= 0.0 {
        return 0;
    }

    let total_subcarriers = (bandwidth_hz / scs.as_hz()).floor() as u32;
    let nrb = total_subcarriers / SUBCARRIERS_PER_RB;

    trace!("Calculated {} RBs for {}Hz bandwidth with {}kHz SCS",
           nrb, bandwidth_hz, scs.as_khz());

    nrb
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dbm_watts_conversion() {
        assert!((dbm_to_watts(30.0) - 1.0).abs() < 1e-12);
        assert!((dbm_to_watts(0.0) - 1e-3).abs() < 1e-15);
        assert!((watts_to_dbm(1.0) - 30.0).abs() < 1e-12);
        assert!((watts_to_dbm(dbm_to_watts(30.0)) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_nrb() {
        // 20 MHz bandwidth with 30 kHz SCS
        assert_eq!(calculate_nrb(20e6, SubcarrierSpacing::Scs30), 55);

        // 100 MHz bandwidth with 30 kHz SCS
        assert_eq!(calculate_nrb(100e6, SubcarrierSpacing::Scs30), 277);

        assert_eq!(calculate_nrb(0.0, SubcarrierSpacing::Scs15), 0);
    }

    proptest! {
        #[test]
        fn prop_dbm_round_trip(watts in 1e-15f64..1e6) {
            let back = dbm_to_watts(watts_to_dbm(watts));
            prop_assert!((back - watts).abs() <= watts * 1e-9);
        }
    }
}

//! Downlink throughput aggregation
//!
//! Scales a transport block over layers, PRBs, slots and the TDD split,
//! then discounts MAC-to-application framing overhead.

use common::{DlUlRatio, SubcarrierSpacing};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LayerError;

/// Default fraction of PRBs lost to control and reference overhead
pub const DEFAULT_PRB_OVERHEAD: f64 = 0.18;

/// Cell-level parameters for aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputConfig {
    /// Spatial layers
    pub num_layers: u32,
    /// PRBs configured in the cell
    pub prb_count: u32,
    /// Fraction of PRBs consumed by overhead
    pub prb_overhead_fraction: f64,
    /// TDD split as "DL:UL"
    pub dl_ul_ratio: String,
    /// Numerology; sets the slot duration
    pub scs: SubcarrierSpacing,
    /// Application packet size in bytes
    pub app_packet_bytes: u32,
    /// MAC packet size in bytes
    pub mac_packet_bytes: u32,
}

/// Aggregation trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThroughputResult {
    pub bits_per_prb: u64,
    pub available_prbs: u32,
    pub bits_per_slot: u64,
    pub dl_fraction: f64,
    pub slot_duration_s: f64,
    pub dl_mac_throughput_bps: f64,
    pub app_throughput_bps: f64,
}

/// TBS carried across all layers
pub fn total_bits_per_prb(tbs: u64, num_layers: u32) -> Result<u64, LayerError> {
    tbs.checked_mul(num_layers as u64).ok_or_else(|| {
        LayerError::InvalidInput(format!("{} bits x {} layers overflows", tbs, num_layers))
    })
}

/// PRBs left after removing ceil(prb_count * overhead)
pub fn total_prbs_available(prb_count: u32, overhead_fraction: f64) -> u32 {
    let overhead = (prb_count as f64 * overhead_fraction).ceil() as u32;
    prb_count.saturating_sub(overhead)
}

/// Bits delivered in one slot
pub fn bits_per_slot(bits_per_prb: u64, available_prbs: u32) -> Result<u64, LayerError> {
    bits_per_prb.checked_mul(available_prbs as u64).ok_or_else(|| {
        LayerError::InvalidInput(format!("{} bits x {} PRBs overflows", bits_per_prb, available_prbs))
    })
}

/// Downlink share of time from a "DL:UL" string
pub fn dl_fraction(ratio: &str) -> Result<f64, LayerError> {
    let ratio: DlUlRatio = ratio.parse()?;
    Ok(ratio.dl_fraction())
}

/// DL MAC throughput in bits/s
pub fn dl_mac_throughput_bps(bits_per_slot: u64, dl_fraction: f64, slot_duration_s: f64) -> f64 {
    bits_per_slot as f64 * dl_fraction / slot_duration_s
}

/// Application throughput after MAC framing overhead
pub fn application_throughput_bps(mac_throughput_bps: f64, app_packet_bits: f64, mac_packet_bits: f64) -> f64 {
    mac_throughput_bps * (app_packet_bits / mac_packet_bits)
}

impl ThroughputConfig {
    /// Reject configurations that would divide by zero or go negative
    pub fn validate(&self) -> Result<(), LayerError> {
        if self.num_layers == 0 {
            return Err(LayerError::InvalidInput("layer count must be positive".into()));
        }
        if self.prb_count == 0 {
            return Err(LayerError::InvalidInput("PRB count must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.prb_overhead_fraction) {
            return Err(LayerError::InvalidInput(format!(
                "PRB overhead fraction must be in [0, 1), got {}", self.prb_overhead_fraction
            )));
        }
        if self.app_packet_bytes == 0 || self.mac_packet_bytes == 0 {
            return Err(LayerError::InvalidInput("packet sizes must be positive".into()));
        }
        Ok(())
    }

    /// Aggregate a transport block size into throughput
    pub fn aggregate(&self, tbs: u64) -> Result<ThroughputResult, LayerError> {
        self.validate()?;
        let dl_fraction = dl_fraction(&self.dl_ul_ratio)?;

        let bits_per_prb = total_bits_per_prb(tbs, self.num_layers)?;
        let available_prbs = total_prbs_available(self.prb_count, self.prb_overhead_fraction);
        let bits_per_slot = bits_per_slot(bits_per_prb, available_prbs)?;
        let slot_duration_s = self.scs.slot_duration_s();

        let dl_mac_throughput_bps = dl_mac_throughput_bps(bits_per_slot, dl_fraction, slot_duration_s);
        let app_throughput_bps = application_throughput_bps(
            dl_mac_throughput_bps,
            self.app_packet_bytes as f64 * 8.0,
            self.mac_packet_bytes as f64 * 8.0,
        );

        debug!(
            "Throughput: {} bits/PRB x {} PRBs = {} bits/slot, DL fraction {:.3}, slot {} s, MAC {:.0} bps, app {:.0} bps",
            bits_per_prb, available_prbs, bits_per_slot, dl_fraction, slot_duration_s,
            dl_mac_throughput_bps, app_throughput_bps
        );

        Ok(ThroughputResult {
            bits_per_prb,
            available_prbs,
            bits_per_slot,
            dl_fraction,
            slot_duration_s,
            dl_mac_throughput_bps,
            app_throughput_bps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ThroughputConfig {
        ThroughputConfig {
            num_layers: 2,
            prb_count: 100,
            prb_overhead_fraction: DEFAULT_PRB_OVERHEAD,
            dl_ul_ratio: "4:1".into(),
            scs: SubcarrierSpacing::Scs120,
            app_packet_bytes: 1460,
            mac_packet_bytes: 1488,
        }
    }

    #[test]
    fn test_prbs_available() {
        assert_eq!(total_prbs_available(100, 0.18), 82);
        // ceil(273 * 0.18) = ceil(49.14) = 50
        assert_eq!(total_prbs_available(273, 0.18), 223);
        assert_eq!(total_prbs_available(1, 0.18), 0);
        assert_eq!(total_prbs_available(50, 0.0), 50);
    }

    #[test]
    fn test_dl_fraction() {
        assert!((dl_fraction("4:1").unwrap() - 0.8).abs() < 1e-12);
        assert!((dl_fraction("1:1").unwrap() - 0.5).abs() < 1e-12);
        assert!(matches!(dl_fraction("4-1"), Err(LayerError::InvalidInput(_))));
        assert!(matches!(dl_fraction("4:0"), Err(LayerError::InvalidInput(_))));
    }

    #[test]
    fn test_aggregate() {
        let result = config().aggregate(9992).unwrap();
        assert_eq!(result.bits_per_prb, 19984);
        assert_eq!(result.available_prbs, 82);
        assert_eq!(result.bits_per_slot, 19984 * 82);
        assert!((result.slot_duration_s - 125e-6).abs() < 1e-15);

        let expected_mac = (19984.0 * 82.0) * 0.8 / 125e-6;
        assert!((result.dl_mac_throughput_bps - expected_mac).abs() / expected_mac < 1e-12);

        let expected_app = expected_mac * 1460.0 / 1488.0;
        assert!((result.app_throughput_bps - expected_app).abs() / expected_app < 1e-12);
    }

    #[test]
    fn test_malformed_ratio_is_reported() {
        let mut cfg = config();
        cfg.dl_ul_ratio = "four to one".into();
        assert!(matches!(cfg.aggregate(1000), Err(LayerError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_config() {
        let mut cfg = config();
        cfg.mac_packet_bytes = 0;
        assert!(cfg.aggregate(1000).is_err());

        let mut cfg = config();
        cfg.prb_overhead_fraction = 1.0;
        assert!(cfg.aggregate(1000).is_err());

        let mut cfg = config();
        cfg.num_layers = 0;
        assert!(cfg.aggregate(1000).is_err());
    }

    #[test]
    fn test_oversized_cell_is_rejected() {
        let mut cfg = config();
        cfg.num_layers = u32::MAX;
        cfg.prb_count = u32::MAX;
        assert!(matches!(cfg.aggregate(1160), Err(LayerError::InvalidInput(_))));

        assert!(matches!(total_bits_per_prb(u64::MAX, 2), Err(LayerError::InvalidInput(_))));
        assert_eq!(total_bits_per_prb(1160, u32::MAX).unwrap(), 1160 * u32::MAX as u64);
        assert!(matches!(bits_per_slot(u64::MAX / 2, 3), Err(LayerError::InvalidInput(_))));
    }

    #[test]
    fn test_throughput_monotone_in_tbs() {
        let cfg = config();
        let mut previous = 0.0;
        for tbs in [24, 1000, 3824, 3832, 9992, 50000] {
            let result = cfg.aggregate(tbs).unwrap();
            assert!(result.app_throughput_bps >= previous);
            previous = result.app_throughput_bps;
        }
    }
}

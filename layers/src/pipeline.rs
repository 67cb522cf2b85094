//! Downlink throughput pipeline
//!
//! Chains link budget -> spectral efficiency -> CQI -> MCS -> RE accounting
//! -> TBS -> throughput. Each run is a pure function of its inputs and the
//! static tables, so independent runs can be evaluated concurrently.

use common::SubcarrierSpacing;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::mac::{ThroughputConfig, DEFAULT_PRB_OVERHEAD};
use crate::phy::capacity::spectral_efficiency;
use crate::phy::link_budget::{LinkBudgetInputs, LinkBudgetResult};
use crate::phy::tbs::{determine_tbs, information_bits};
use crate::phy::{mcs_by_index, select_cqi, select_mcs, ReAllocation};
use crate::LayerError;

/// Cell and allocation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioConfig {
    /// Numerology µ (0-4)
    pub numerology: u8,
    /// PRBs configured in the cell
    pub prb_count: u32,
    /// Per-UE PDSCH allocation
    pub allocation: ReAllocation,
    /// Fraction of PRBs consumed by overhead
    pub prb_overhead_fraction: f64,
    /// TDD split as "DL:UL"
    pub dl_ul_ratio: String,
    /// Application packet size in bytes
    pub app_packet_bytes: u32,
    /// MAC packet size in bytes
    pub mac_packet_bytes: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            numerology: 3,
            prb_count: 66,
            allocation: ReAllocation::default(),
            prb_overhead_fraction: DEFAULT_PRB_OVERHEAD,
            dl_ul_ratio: "4:1".to_string(),
            app_packet_bytes: 1460,
            mac_packet_bytes: 1488,
        }
    }
}

/// A lookup that fell back to a table boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LookupWarning {
    /// Spectral efficiency below the CQI table
    CqiBelowTable,
    /// CQI efficiency below MCS 0
    McsBelowTable,
    /// N'info above the TBS table
    TbsAboveTable,
}

/// Full trace of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub link_budget: LinkBudgetResult,
    pub spectral_efficiency: f64,
    pub cqi_index: u8,
    pub cqi_spectral_efficiency: f64,
    pub mcs_index: u8,
    pub modulation_order: u8,
    pub code_rate_x1024: f64,
    pub available_res: i64,
    pub information_bits: f64,
    pub quantization_exponent: u32,
    pub quantized_information_bits: u64,
    pub transport_block_size: u64,
    pub code_blocks: u64,
    pub bits_per_prb: u64,
    pub available_prbs: u32,
    pub bits_per_slot: u64,
    pub dl_fraction: f64,
    pub slot_duration_s: f64,
    pub dl_mac_throughput_bps: f64,
    pub application_throughput_bps: f64,
    /// Lookups that were clamped to a table boundary
    pub warnings: Vec<LookupWarning>,
}

impl PipelineResult {
    /// Code rate R as a fraction
    pub fn code_rate(&self) -> f64 {
        self.code_rate_x1024 / 1024.0
    }

    /// True when every table lookup matched without clamping
    pub fn is_exact(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Evaluate one downlink throughput estimate
pub fn evaluate(link: &LinkBudgetInputs, radio: &RadioConfig) -> Result<PipelineResult, LayerError> {
    let mut warnings = Vec::new();

    let link_budget = link.estimate()?;

    let spectral_efficiency = spectral_efficiency(link_budget.snr_linear)?;
    let cqi = select_cqi(spectral_efficiency);
    if cqi.clamped {
        warnings.push(LookupWarning::CqiBelowTable);
    }
    let mcs = select_mcs(cqi.value.spectral_efficiency);
    if mcs.clamped {
        warnings.push(LookupWarning::McsBelowTable);
    }
    debug!("SE={:.4} b/s/Hz -> {} -> {}", spectral_efficiency, cqi.value, mcs.value);

    let available_res = radio.allocation.available_res();
    if available_res <= 0 {
        return Err(LayerError::InvalidInput(format!(
            "allocation leaves {} REs for PDSCH", available_res
        )));
    }

    let ninfo = information_bits(available_res, mcs.value.code_rate_x1024, mcs.value.modulation_order());
    let tbs = determine_tbs(ninfo, mcs.value.code_rate_x1024)?;
    if tbs.clamped {
        warnings.push(LookupWarning::TbsAboveTable);
    }

    let scs = SubcarrierSpacing::from_numerology(radio.numerology).ok_or_else(|| {
        LayerError::InvalidInput(format!("unsupported numerology {}", radio.numerology))
    })?;
    let throughput = ThroughputConfig {
        num_layers: link.num_layers,
        prb_count: radio.prb_count,
        prb_overhead_fraction: radio.prb_overhead_fraction,
        dl_ul_ratio: radio.dl_ul_ratio.clone(),
        scs,
        app_packet_bytes: radio.app_packet_bytes,
        mac_packet_bytes: radio.mac_packet_bytes,
    }
    .aggregate(tbs.tbs)?;

    if !warnings.is_empty() {
        warn!("Evaluation used clamped lookups: {:?}", warnings);
    }
    info!(
        "Evaluated: CQI {}, MCS {}, TBS {} bits, application throughput {:.3} Mbps",
        cqi.value.index,
        mcs.value.index,
        tbs.tbs,
        throughput.app_throughput_bps / 1e6
    );

    Ok(PipelineResult {
        link_budget,
        spectral_efficiency,
        cqi_index: cqi.value.index,
        cqi_spectral_efficiency: cqi.value.spectral_efficiency,
        mcs_index: mcs.value.index,
        modulation_order: mcs.value.modulation_order(),
        code_rate_x1024: mcs.value.code_rate_x1024,
        available_res,
        information_bits: ninfo,
        quantization_exponent: tbs.exponent,
        quantized_information_bits: tbs.ninfo_prime,
        transport_block_size: tbs.tbs,
        code_blocks: tbs.code_blocks,
        bits_per_prb: throughput.bits_per_prb,
        available_prbs: throughput.available_prbs,
        bits_per_slot: throughput.bits_per_slot,
        dl_fraction: throughput.dl_fraction,
        slot_duration_s: throughput.slot_duration_s,
        dl_mac_throughput_bps: throughput.dl_mac_throughput_bps,
        application_throughput_bps: throughput.app_throughput_bps,
        warnings,
    })
}

/// Information bits per slot for a fixed MCS index
pub fn information_bits_per_slot(mcs_index: u8, num_prbs: u32, symbols_per_slot: u32) -> Result<f64, LayerError> {
    let mcs = mcs_by_index(mcs_index)?;
    let allocation = ReAllocation {
        symbols_per_slot,
        num_prbs,
        ..Default::default()
    };

    let available_res = allocation.available_res();
    if available_res <= 0 {
        return Err(LayerError::InvalidInput(format!(
            "{} PRBs x {} symbols leaves no REs", num_prbs, symbols_per_slot
        )));
    }

    Ok(information_bits(available_res, mcs.code_rate_x1024, mcs.modulation_order()))
}

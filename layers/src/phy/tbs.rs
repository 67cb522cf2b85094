//! Transport Block Size determination
//!
//! Information bit count and TBS quantization for PDSCH,
//! 3GPP TS 38.214 Section 5.1.3.2.

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::TableLookup;
use crate::LayerError;

/// Ninfo threshold separating the table and formula paths
pub const TBS_THRESHOLD: u64 = 3824;

/// Code block payload limit for low code rates (R <= 1/4)
const LOW_RATE_CB_PAYLOAD: u64 = 3816;

/// Code block payload limit for base graph 1
const CB_PAYLOAD: u64 = 8424;

/// Transport block CRC length
const TB_CRC_BITS: u64 = 24;

/// Smallest transport block
const MIN_NINFO_PRIME: f64 = 24.0;

/// Larger Ninfo values have no physical meaning and overflow the integer path
const MAX_NINFO: f64 = 1e15;

/// TBS for Ninfo <= 3824, Table 5.1.3.2-1
pub static TBS_TABLE: [u32; 93] = [
    24, 32, 40, 48, 56, 64, 72, 80, 88, 96, 104, 112, 120, 128, 136, 144, 152, 160, 168, 176,
    184, 192, 208, 224, 240, 256, 272, 288, 304, 320, 336, 352, 368, 384, 408, 432, 456, 480,
    504, 528, 552, 576, 608, 640, 672, 704, 736, 768, 808, 848, 888, 928, 984, 1032, 1064,
    1128, 1160, 1192, 1224, 1256, 1288, 1320, 1352, 1416, 1480, 1544, 1608, 1672, 1736, 1800,
    1864, 1928, 2024, 2088, 2152, 2216, 2280, 2408, 2472, 2536, 2600, 2664, 2728, 2792, 2856,
    2976, 3104, 3240, 3368, 3496, 3624, 3752, 3824,
];

/// Quantized information bit count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NinfoQuantization {
    /// Quantization exponent n; N'info is a multiple of 2^n
    pub exponent: u32,
    /// N'info
    pub ninfo_prime: u64,
}

/// Complete TBS derivation trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TbsDetermination {
    /// Ninfo before quantization
    pub ninfo: f64,
    /// Quantization exponent n
    pub exponent: u32,
    /// N'info
    pub ninfo_prime: u64,
    /// Transport block size in bits
    pub tbs: u64,
    /// Number of code blocks C
    pub code_blocks: u64,
    /// TBS came from the table rather than the formula
    pub from_table: bool,
    /// Table lookup fell back to the largest entry
    pub clamped: bool,
}

/// Ninfo = N_RE * R * Qm
pub fn information_bits(available_res: i64, code_rate_x1024: f64, modulation_order: u8) -> f64 {
    available_res as f64 * (code_rate_x1024 / 1024.0) * modulation_order as f64
}

/// Quantize Ninfo to N'info.
///
/// For Ninfo <= 3824 the value is floored to a multiple of 2^n with a 24 bit
/// minimum; above the threshold Ninfo - 24 is rounded to the nearest multiple.
pub fn quantize_ninfo(ninfo: f64) -> Result<NinfoQuantization, LayerError> {
    if !(ninfo > 0.0) || !ninfo.is_finite() {
        return Err(LayerError::UndefinedOperation(format!(
            "Ninfo must be positive and finite to quantize, got {}", ninfo
        )));
    }
    if ninfo > MAX_NINFO {
        return Err(LayerError::InvalidInput(format!("Ninfo {} is out of range", ninfo)));
    }

    let (exponent, ninfo_prime) = if ninfo <= TBS_THRESHOLD as f64 {
        let n = (ninfo.log2().floor() as i64 - 6).max(3) as u32;
        let step = 2f64.powi(n as i32);
        let prime = (step * (ninfo / step).floor()).max(MIN_NINFO_PRIME);
        (n, prime as u64)
    } else {
        let reduced = ninfo - TB_CRC_BITS as f64;
        let n = (reduced.log2().floor() as i64 - 5) as u32;
        let step = 2f64.powi(n as i32);
        let prime = step * (reduced / step).round();
        (n, prime as u64)
    };

    trace!("Quantized Ninfo={} with n={} to N'info={}", ninfo, exponent, ninfo_prime);

    Ok(NinfoQuantization { exponent, ninfo_prime })
}

/// Smallest tabulated TBS not less than `ninfo_prime`.
///
/// Values above the table fall back to the largest entry and are flagged.
pub fn lookup_tbs_table(ninfo_prime: u64) -> TableLookup<u32> {
    let idx = TBS_TABLE.partition_point(|&tbs| (tbs as u64) < ninfo_prime);

    match TBS_TABLE.get(idx) {
        Some(&tbs) => TableLookup::exact(tbs),
        None => {
            let largest = TBS_TABLE[TBS_TABLE.len() - 1];
            warn!("N'info={} exceeds the TBS table, using {}", ninfo_prime, largest);
            TableLookup::clamped(largest)
        }
    }
}

/// Number of code blocks C for the formula path
pub fn code_block_count(ninfo_prime: u64, code_rate: f64) -> u64 {
    let payload = ninfo_prime + TB_CRC_BITS;
    if code_rate <= 0.25 {
        payload.div_ceil(LOW_RATE_CB_PAYLOAD)
    } else if ninfo_prime >= CB_PAYLOAD {
        payload.div_ceil(CB_PAYLOAD)
    } else {
        1
    }
}

/// TBS for N'info > 3824: 8*C*ceil((N'info + 24) / 8C) - 24
pub fn tbs_from_formula(ninfo_prime: u64, code_rate: f64) -> (u64, u64) {
    let code_blocks = code_block_count(ninfo_prime, code_rate);
    let payload = ninfo_prime + TB_CRC_BITS;
    let tbs = 8 * code_blocks * payload.div_ceil(8 * code_blocks) - TB_CRC_BITS;
    (tbs, code_blocks)
}

/// Map N'info to a TBS, choosing the table or the formula path on N'info
pub fn tbs_for_ninfo_prime(ninfo_prime: u64, code_rate: f64) -> (TableLookup<u64>, u64) {
    if ninfo_prime <= TBS_THRESHOLD {
        let lookup = lookup_tbs_table(ninfo_prime);
        (
            TableLookup { value: lookup.value as u64, clamped: lookup.clamped },
            1,
        )
    } else {
        let (tbs, code_blocks) = tbs_from_formula(ninfo_prime, code_rate);
        (TableLookup::exact(tbs), code_blocks)
    }
}

/// Run the full TBS determination for a given Ninfo and code rate
pub fn determine_tbs(ninfo: f64, code_rate_x1024: f64) -> Result<TbsDetermination, LayerError> {
    if !(code_rate_x1024 > 0.0 && code_rate_x1024 <= 1024.0) {
        return Err(LayerError::InvalidInput(format!(
            "code rate x1024 must be in (0, 1024], got {}", code_rate_x1024
        )));
    }

    let NinfoQuantization { exponent, ninfo_prime } = quantize_ninfo(ninfo)?;
    let (lookup, code_blocks) = tbs_for_ninfo_prime(ninfo_prime, code_rate_x1024 / 1024.0);

    debug!(
        "TBS: Ninfo={:.2}, n={}, N'info={}, TBS={}, C={}",
        ninfo, exponent, ninfo_prime, lookup.value, code_blocks
    );

    Ok(TbsDetermination {
        ninfo,
        exponent,
        ninfo_prime,
        tbs: lookup.value,
        code_blocks,
        from_table: ninfo_prime <= TBS_THRESHOLD,
        clamped: lookup.clamped,
    })
}

//! Common Types for 5G NR Link Calculations
//!
//! Defines the radio parameters shared by every stage of the estimator

use std::fmt;
use std::str::FromStr;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subcarrier spacing values in kHz
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive, Serialize, Deserialize)]
pub enum SubcarrierSpacing {
    /// 15 kHz (numerology 0)
    Scs15 = 15,
    /// 30 kHz (numerology 1)
    Scs30 = 30,
    /// 60 kHz (numerology 2)
    Scs60 = 60,
    /// 120 kHz (numerology 3)
    Scs120 = 120,
    /// 240 kHz (numerology 4)
    Scs240 = 240,
}

impl SubcarrierSpacing {
    /// Map a numerology index µ to its subcarrier spacing (15 kHz * 2^µ)
    pub fn from_numerology(mu: u8) -> Option<Self> {
        match mu {
            0 => Some(Self::Scs15),
            1 => Some(Self::Scs30),
            2 => Some(Self::Scs60),
            3 => Some(Self::Scs120),
            4 => Some(Self::Scs240),
            _ => None,
        }
    }

    /// Numerology index µ
    pub fn numerology(&self) -> u8 {
        match self {
            Self::Scs15 => 0,
            Self::Scs30 => 1,
            Self::Scs60 => 2,
            Self::Scs120 => 3,
            Self::Scs240 => 4,
        }
    }

    /// Spacing in kHz
    pub fn as_khz(&self) -> u32 {
        *self as u32
    }

    /// Spacing in Hz
    pub fn as_hz(&self) -> f64 {
        self.as_khz() as f64 * 1e3
    }

    /// Number of slots in one 1 ms subframe
    pub fn slots_per_subframe(&self) -> u32 {
        1 << self.numerology()
    }

    /// Slot duration in seconds (1 ms / 2^µ)
    pub fn slot_duration_s(&self) -> f64 {
        1e-3 / self.slots_per_subframe() as f64
    }
}

/// Downlink modulation schemes, keyed by modulation order Qm
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive, Serialize, Deserialize)]
pub enum ModulationScheme {
    /// QPSK (Qm = 2)
    Qpsk = 2,
    /// 16-QAM (Qm = 4)
    Qam16 = 4,
    /// 64-QAM (Qm = 6)
    Qam64 = 6,
    /// 256-QAM (Qm = 8)
    Qam256 = 8,
}

impl ModulationScheme {
    /// Look up the scheme carrying `qm` bits per symbol
    pub fn from_order(qm: u8) -> Option<Self> {
        Self::from_u8(qm)
    }

    /// Look up the scheme for a square constellation of `m` points
    pub fn from_constellation_size(m: u32) -> Option<Self> {
        if !m.is_power_of_two() {
            return None;
        }
        u8::try_from(m.trailing_zeros())
            .ok()
            .and_then(Self::from_order)
    }

    /// Modulation order Qm (bits per symbol)
    pub fn order(&self) -> u8 {
        *self as u8
    }

    /// Number of constellation points M
    pub fn constellation_size(&self) -> u32 {
        1 << self.order()
    }

    /// Average symbol energy of the unnormalized square constellation, 2(M-1)/3
    pub fn average_energy(&self) -> f64 {
        2.0 * (self.constellation_size() as f64 - 1.0) / 3.0
    }

    /// Amplitude scale giving unit average power, 1/sqrt(2(M-1)/3)
    pub fn normalization_factor(&self) -> f64 {
        1.0 / self.average_energy().sqrt()
    }
}

impl fmt::Display for ModulationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Qpsk => "QPSK",
            Self::Qam16 => "16QAM",
            Self::Qam64 => "64QAM",
            Self::Qam256 => "256QAM",
        };
        f.write_str(label)
    }
}

/// Errors raised while parsing a "DL:UL" ratio string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatioParseError {
    #[error("DL:UL ratio '{0}' is missing the ':' separator")]
    MissingSeparator(String),

    #[error("DL:UL ratio component '{0}' is not an integer")]
    InvalidComponent(String),

    #[error("DL:UL ratio '{0}' must use positive integers")]
    NonPositive(String),
}

/// TDD downlink/uplink split, e.g. "4:1"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlUlRatio {
    /// Downlink share
    pub dl: u32,
    /// Uplink share
    pub ul: u32,
}

impl DlUlRatio {
    /// Create a ratio, rejecting zero shares
    pub fn new(dl: u32, ul: u32) -> Option<Self> {
        if dl > 0 && ul > 0 {
            Some(Self { dl, ul })
        } else {
            None
        }
    }

    /// Fraction of time spent in downlink, dl / (dl + ul)
    pub fn dl_fraction(&self) -> f64 {
        self.dl as f64 / (self.dl as f64 + self.ul as f64)
    }
}

impl FromStr for DlUlRatio {
    type Err = RatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dl, ul) = s
            .split_once(':')
            .ok_or_else(|| RatioParseError::MissingSeparator(s.to_string()))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| RatioParseError::InvalidComponent(part.to_string()))
        };

        Self::new(parse(dl)?, parse(ul)?).ok_or_else(|| RatioParseError::NonPositive(s.to_string()))
    }
}

impl fmt::Display for DlUlRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dl, self.ul)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numerology_mapping() {
        assert_eq!(SubcarrierSpacing::from_numerology(0), Some(SubcarrierSpacing::Scs15));
        assert_eq!(SubcarrierSpacing::from_numerology(3), Some(SubcarrierSpacing::Scs120));
        assert_eq!(SubcarrierSpacing::from_numerology(5), None);
        assert_eq!(SubcarrierSpacing::Scs240.numerology(), 4);
    }

    #[test]
    fn test_slot_timing() {
        assert_eq!(SubcarrierSpacing::Scs120.slots_per_subframe(), 8);
        assert!((SubcarrierSpacing::Scs15.slot_duration_s() - 1e-3).abs() < 1e-15);
        assert!((SubcarrierSpacing::Scs120.slot_duration_s() - 125e-6).abs() < 1e-15);
        assert!((SubcarrierSpacing::Scs240.slot_duration_s() - 62.5e-6).abs() < 1e-15);
    }

    #[test]
    fn test_modulation_scheme() {
        assert_eq!(ModulationScheme::from_order(6), Some(ModulationScheme::Qam64));
        assert_eq!(ModulationScheme::from_order(3), None);
        assert_eq!(ModulationScheme::from_constellation_size(256), Some(ModulationScheme::Qam256));
        assert_eq!(ModulationScheme::from_constellation_size(32), None);
        assert_eq!(ModulationScheme::from_constellation_size(100), None);

        // 16QAM normalizes by 1/sqrt(10)
        assert!((ModulationScheme::Qam16.average_energy() - 10.0).abs() < 1e-12);
        assert!((ModulationScheme::Qam16.normalization_factor() - 1.0 / 10f64.sqrt()).abs() < 1e-12);
        assert!((ModulationScheme::Qpsk.average_energy() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_dl_ul_ratio_parsing() {
        let ratio: DlUlRatio = "4:1".parse().unwrap();
        assert_eq!(ratio, DlUlRatio { dl: 4, ul: 1 });
        assert!((ratio.dl_fraction() - 0.8).abs() < 1e-12);
        assert_eq!(ratio.to_string(), "4:1");

        assert!(matches!("4-1".parse::<DlUlRatio>(), Err(RatioParseError::MissingSeparator(_))));
        assert!(matches!("4:0".parse::<DlUlRatio>(), Err(RatioParseError::NonPositive(_))));
        assert!(matches!("0:3".parse::<DlUlRatio>(), Err(RatioParseError::NonPositive(_))));
        assert!(matches!("a:1".parse::<DlUlRatio>(), Err(RatioParseError::InvalidComponent(_))));
        assert!(matches!("4:-1".parse::<DlUlRatio>(), Err(RatioParseError::InvalidComponent(_))));
    }
}

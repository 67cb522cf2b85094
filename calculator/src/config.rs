//! Scenario Configuration
//!
//! One throughput scenario, loadable from YAML or TOML. Defaults reproduce
//! the fixed settings of the analytical DL throughput calculator.

use std::path::Path;

use anyhow::{anyhow, Context};
use clap::ValueEnum;
use common::{calculate_nrb, SubcarrierSpacing, SUBCARRIERS_PER_RB, SYMBOLS_PER_SLOT};
use layers::mac::DEFAULT_PRB_OVERHEAD;
use layers::phy::ReAllocation;
use layers::{LinkBudgetInputs, RadioConfig};
use serde::{Deserialize, Serialize};

/// Main scenario structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScenarioConfig {
    /// Radio link parameters
    #[serde(default)]
    pub link: LinkConfig,
    /// Cell and PDSCH allocation
    #[serde(default)]
    pub cell: CellConfig,
    /// Traffic model
    #[serde(default)]
    pub traffic: TrafficConfig,
}

/// Supported antenna configurations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
pub enum MimoConfig {
    #[default]
    #[serde(rename = "1x1")]
    #[value(name = "1x1")]
    Siso,
    #[serde(rename = "2x2")]
    #[value(name = "2x2")]
    Mimo2x2,
    #[serde(rename = "4x4")]
    #[value(name = "4x4")]
    Mimo4x4,
    #[serde(rename = "8x8")]
    #[value(name = "8x8")]
    Mimo8x8,
}

impl MimoConfig {
    /// Number of spatial layers
    pub fn layers(&self) -> u32 {
        match self {
            MimoConfig::Siso => 1,
            MimoConfig::Mimo2x2 => 2,
            MimoConfig::Mimo4x4 => 4,
            MimoConfig::Mimo8x8 => 8,
        }
    }
}

/// Link budget configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Antenna configuration
    #[serde(default)]
    pub mimo: MimoConfig,
    /// Channel bandwidth in MHz
    pub bandwidth_mhz: Option<f64>,
    /// Total transmit power in dBm
    pub tx_power_dbm: Option<f64>,
    /// Path loss in dB
    pub path_loss_db: Option<f64>,
    /// Shadowing loss in dB
    #[serde(default)]
    pub shadowing_loss_db: f64,
    /// Outdoor-to-indoor loss in dB
    #[serde(default)]
    pub o2i_loss_db: f64,
    /// Beamforming gain per layer in dB
    #[serde(default)]
    pub beamforming_gain_db: f64,
    /// Receiver temperature in Kelvin
    #[serde(default = "default_temperature_k")]
    pub temperature_k: f64,
}

fn default_temperature_k() -> f64 {
    300.0
}

/// Cell configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CellConfig {
    /// Numerology µ
    #[serde(default = "default_numerology")]
    pub numerology: u8,
    /// PRBs configured in the gNB; derived from bandwidth when absent
    pub prb_count: Option<u32>,
    /// PRBs allocated to the UE
    #[serde(default = "default_prbs_per_ue")]
    pub prbs_per_ue: u32,
    /// Subcarriers per RB
    #[serde(default = "default_subcarriers_per_rb")]
    pub subcarriers_per_rb: u32,
    /// PDSCH symbols per slot
    #[serde(default = "default_symbols_per_slot")]
    pub symbols_per_slot: u32,
    /// DMRS REs per PRB
    #[serde(default)]
    pub dmrs_res_per_prb: u32,
    /// Higher-layer overhead REs per PRB
    #[serde(default)]
    pub overhead_res_per_prb: u32,
    /// Fraction of PRBs consumed by overhead
    #[serde(default = "default_prb_overhead_fraction")]
    pub prb_overhead_fraction: f64,
}

fn default_numerology() -> u8 {
    3
}

fn default_prbs_per_ue() -> u32 {
    1  // Minimum allocation a UE can expect
}

fn default_subcarriers_per_rb() -> u32 {
    SUBCARRIERS_PER_RB
}

fn default_symbols_per_slot() -> u32 {
    SYMBOLS_PER_SLOT
}

fn default_prb_overhead_fraction() -> f64 {
    DEFAULT_PRB_OVERHEAD
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            numerology: default_numerology(),
            prb_count: None,
            prbs_per_ue: default_prbs_per_ue(),
            subcarriers_per_rb: default_subcarriers_per_rb(),
            symbols_per_slot: default_symbols_per_slot(),
            dmrs_res_per_prb: 0,
            overhead_res_per_prb: 0,
            prb_overhead_fraction: default_prb_overhead_fraction(),
        }
    }
}

/// Traffic configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrafficConfig {
    /// TDD split as "DL:UL"
    #[serde(default = "default_dl_ul_ratio")]
    pub dl_ul_ratio: String,
    /// Application packet size in bytes
    #[serde(default = "default_app_packet_bytes")]
    pub app_packet_bytes: u32,
    /// MAC packet size in bytes
    #[serde(default = "default_mac_packet_bytes")]
    pub mac_packet_bytes: u32,
}

fn default_dl_ul_ratio() -> String {
    "4:1".to_string()
}

fn default_app_packet_bytes() -> u32 {
    1460
}

fn default_mac_packet_bytes() -> u32 {
    1488
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            dl_ul_ratio: default_dl_ul_ratio(),
            app_packet_bytes: default_app_packet_bytes(),
            mac_packet_bytes: default_mac_packet_bytes(),
        }
    }
}

impl ScenarioConfig {
    /// Load from a `.yml`/`.yaml` or `.toml` file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario file {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml") | Some("yaml") => Self::from_yaml_str(&contents),
            Some("toml") => Self::from_toml_str(&contents),
            _ => Err(anyhow!("Unsupported scenario file extension: {}", path.display())),
        }
    }

    /// Parse YAML text
    pub fn from_yaml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Parse TOML text
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolve into pipeline inputs, enforcing the front-end input rules
    pub fn resolve(&self) -> anyhow::Result<(LinkBudgetInputs, RadioConfig)> {
        let bandwidth_mhz = self.link.bandwidth_mhz
            .ok_or_else(|| anyhow!("Bandwidth is required (--bandwidth-mhz)"))?;
        if !(bandwidth_mhz > 0.0) {
            return Err(anyhow!("Bandwidth must be positive: {} MHz", bandwidth_mhz));
        }

        let tx_power_dbm = self.link.tx_power_dbm
            .ok_or_else(|| anyhow!("Transmit power is required (--tx-power-dbm)"))?;
        if !(tx_power_dbm > 0.0) {
            return Err(anyhow!("Transmit power must be positive: {} dBm", tx_power_dbm));
        }

        let path_loss_db = self.link.path_loss_db
            .ok_or_else(|| anyhow!("Path loss is required (--path-loss-db)"))?;
        check_path_loss(path_loss_db)?;

        let scs = SubcarrierSpacing::from_numerology(self.cell.numerology)
            .ok_or_else(|| anyhow!("Invalid numerology: {}", self.cell.numerology))?;

        let bandwidth_hz = bandwidth_mhz * 1e6;
        let prb_count = match self.cell.prb_count {
            Some(count) => count,
            None => calculate_nrb(bandwidth_hz, scs),
        };
        if prb_count == 0 {
            return Err(anyhow!("PRB count must be positive"));
        }

        let link = LinkBudgetInputs {
            path_loss_db,
            shadowing_loss_db: self.link.shadowing_loss_db,
            penetration_loss_db: self.link.o2i_loss_db,
            tx_power_dbm,
            num_layers: self.link.mimo.layers(),
            beamforming_gain_db: self.link.beamforming_gain_db,
            temperature_k: self.link.temperature_k,
            bandwidth_hz,
        };

        let radio = RadioConfig {
            numerology: self.cell.numerology,
            prb_count,
            allocation: ReAllocation {
                subcarriers_per_rb: self.cell.subcarriers_per_rb,
                symbols_per_slot: self.cell.symbols_per_slot,
                dmrs_res_per_prb: self.cell.dmrs_res_per_prb,
                overhead_res_per_prb: self.cell.overhead_res_per_prb,
                num_prbs: self.cell.prbs_per_ue,
            },
            prb_overhead_fraction: self.cell.prb_overhead_fraction,
            dl_ul_ratio: self.traffic.dl_ul_ratio.clone(),
            app_packet_bytes: self.traffic.app_packet_bytes,
            mac_packet_bytes: self.traffic.mac_packet_bytes,
        };

        Ok((link, radio))
    }
}

/// Largest number of points a sweep may expand to
pub const MAX_SWEEP_POINTS: usize = 10_000;

fn parse_sweep_value(value: &str) -> anyhow::Result<f64> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| anyhow!("Invalid sweep value: {}", value))?;
    if !parsed.is_finite() {
        return Err(anyhow!("Sweep value must be finite: {}", value));
    }
    Ok(parsed)
}

/// Parse a sweep range "start:stop:step" (inclusive) or a comma list
pub fn parse_sweep(spec: &str) -> anyhow::Result<Vec<f64>> {
    let values: Vec<f64> = if spec.contains(',') || !spec.contains(':') {
        spec.split(',').map(parse_sweep_value).collect::<anyhow::Result<_>>()?
    } else {
        let parts: Vec<f64> = spec.split(':').map(parse_sweep_value).collect::<anyhow::Result<_>>()?;

        let &[start, stop, step] = parts.as_slice() else {
            return Err(anyhow!("Sweep range must be start:stop:step, got {}", spec));
        };
        if !(step > 0.0) || stop < start {
            return Err(anyhow!("Sweep range {} is empty or has a non-positive step", spec));
        }

        // Infinite when the span overflows or the step underflows
        let steps = ((stop - start) / step + 1e-9).floor();
        if !(steps < MAX_SWEEP_POINTS as f64) {
            return Err(anyhow!("Sweep range {} exceeds {} points", spec, MAX_SWEEP_POINTS));
        }
        (0..=steps as usize).map(|i| start + step * i as f64).collect()
    };

    if values.len() > MAX_SWEEP_POINTS {
        return Err(anyhow!("Sweep list has {} points, the limit is {}", values.len(), MAX_SWEEP_POINTS));
    }
    Ok(values)
}

/// Path loss must be a positive number of dB
pub fn check_path_loss(path_loss_db: f64) -> anyhow::Result<()> {
    if !(path_loss_db > 0.0) || !path_loss_db.is_finite() {
        return Err(anyhow!("Path loss must be positive: {} dB", path_loss_db));
    }
    Ok(())
}

/// Parse a path loss sweep, applying the path loss rule to every point
pub fn parse_path_loss_sweep(spec: &str) -> anyhow::Result<Vec<f64>> {
    let values = parse_sweep(spec)?;
    for &path_loss_db in &values {
        check_path_loss(path_loss_db)?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let yaml = r#"
link:
  mimo: "2x2"
  bandwidth_mhz: 100
  tx_power_dbm: 40
  path_loss_db: 110
cell:
  prb_count: 66
"#;
        let config = ScenarioConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.link.mimo, MimoConfig::Mimo2x2);
        assert_eq!(config.link.temperature_k, 300.0);
        assert_eq!(config.cell.numerology, 3);
        assert_eq!(config.cell.symbols_per_slot, 14);
        assert_eq!(config.traffic.dl_ul_ratio, "4:1");
        assert_eq!(config.traffic.mac_packet_bytes, 1488);

        let (link, radio) = config.resolve().unwrap();
        assert_eq!(link.num_layers, 2);
        assert_eq!(link.bandwidth_hz, 100e6);
        assert_eq!(radio.prb_count, 66);
        assert_eq!(radio.allocation.num_prbs, 1);
        assert_eq!(radio.prb_overhead_fraction, 0.18);
    }

    #[test]
    fn test_toml_scenario() {
        let toml = r#"
[link]
mimo = "4x4"
bandwidth_mhz = 20.0
tx_power_dbm = 30.0
path_loss_db = 95.0
o2i_loss_db = 12.0

[cell]
numerology = 1
prbs_per_ue = 10

[traffic]
dl_ul_ratio = "3:2"
"#;
        let config = ScenarioConfig::from_toml_str(toml).unwrap();
        let (link, radio) = config.resolve().unwrap();
        assert_eq!(link.num_layers, 4);
        assert_eq!(link.penetration_loss_db, 12.0);
        assert_eq!(radio.numerology, 1);
        // 20 MHz at 30 kHz derives 55 PRBs
        assert_eq!(radio.prb_count, 55);
        assert_eq!(radio.allocation.num_prbs, 10);
        assert_eq!(radio.dl_ul_ratio, "3:2");
    }

    #[test]
    fn test_missing_required_fields() {
        let mut config = ScenarioConfig::default();
        assert!(config.resolve().is_err());

        config.link.bandwidth_mhz = Some(100.0);
        config.link.tx_power_dbm = Some(40.0);
        assert!(config.resolve().is_err());

        config.link.path_loss_db = Some(100.0);
        assert!(config.resolve().is_ok());

        config.link.path_loss_db = Some(-3.0);
        assert!(config.resolve().is_err());

        config.link.path_loss_db = Some(100.0);
        config.cell.numerology = 6;
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_mimo_defaults_to_single_layer() {
        assert_eq!(MimoConfig::default(), MimoConfig::Siso);
        let config = ScenarioConfig::from_yaml_str("link:\n  bandwidth_mhz: 20\n").unwrap();
        assert_eq!(config.link.mimo.layers(), 1);
    }

    #[test]
    fn test_unknown_mimo_rejected() {
        let yaml = "link:\n  mimo: \"3x3\"\n";
        assert!(ScenarioConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_parse_sweep() {
        assert_eq!(parse_sweep("100:110:5").unwrap(), vec![100.0, 105.0, 110.0]);
        assert_eq!(parse_sweep("90, 120,150").unwrap(), vec![90.0, 120.0, 150.0]);
        assert_eq!(parse_sweep("130").unwrap(), vec![130.0]);
        assert_eq!(parse_sweep("100:101:0.5").unwrap().len(), 3);

        assert!(parse_sweep("100:90:5").is_err());
        assert!(parse_sweep("100:110:0").is_err());
        assert!(parse_sweep("100:110").is_err());
        assert!(parse_sweep("a,b").is_err());
    }

    #[test]
    fn test_sweep_bounds() {
        assert!(parse_sweep("0:inf:1").is_err());
        assert!(parse_sweep("-inf:0:1").is_err());
        assert!(parse_sweep("0:1:NaN").is_err());
        assert!(parse_sweep("100,inf").is_err());
        assert!(parse_sweep("0:1e12:1").is_err());
        assert!(parse_sweep("-1e308:1e308:1").is_err());
        assert!(parse_sweep("0:1:1e-320").is_err());

        let at_limit = parse_sweep(&format!("1:{}:1", MAX_SWEEP_POINTS)).unwrap();
        assert_eq!(at_limit.len(), MAX_SWEEP_POINTS);
        assert!(parse_sweep(&format!("1:{}:1", MAX_SWEEP_POINTS + 1)).is_err());

        let long_list = vec!["100"; MAX_SWEEP_POINTS + 1].join(",");
        assert!(parse_sweep(&long_list).is_err());
    }

    #[test]
    fn test_path_loss_sweep_checks_every_point() {
        assert_eq!(parse_path_loss_sweep("90,100").unwrap(), vec![90.0, 100.0]);
        assert!(parse_path_loss_sweep("-50,100").is_err());
        assert!(parse_path_loss_sweep("100,0").is_err());
        assert!(parse_path_loss_sweep("-10:10:5").is_err());
        assert_eq!(parse_path_loss_sweep("100:120:10").unwrap(), vec![100.0, 110.0, 120.0]);
    }
}

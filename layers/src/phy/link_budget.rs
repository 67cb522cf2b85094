//! Downlink Link Budget
//!
//! Large-scale loss, per-layer power split, thermal noise and linear SNR

use common::{dbm_to_watts, BOLTZMANN_CONSTANT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LayerError;

/// Link budget inputs for one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkBudgetInputs {
    /// Path loss in dB
    pub path_loss_db: f64,
    /// Shadowing loss in dB
    pub shadowing_loss_db: f64,
    /// Outdoor-to-indoor penetration loss in dB
    pub penetration_loss_db: f64,
    /// Total transmit power in dBm
    pub tx_power_dbm: f64,
    /// Number of spatial layers
    pub num_layers: u32,
    /// Beamforming gain per layer in dB
    pub beamforming_gain_db: f64,
    /// Receiver temperature in Kelvin
    pub temperature_k: f64,
    /// Channel bandwidth in Hz
    pub bandwidth_hz: f64,
}

/// Link budget intermediate values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkBudgetResult {
    pub total_loss_db: f64,
    pub tx_power_per_layer_dbm: f64,
    pub rx_power_per_layer_dbm: f64,
    pub rx_power_per_layer_w: f64,
    pub thermal_noise_w: f64,
    pub snr_linear: f64,
}

/// Sum of large-scale losses; all terms are in dB so they add
pub fn total_loss_db(path_loss_db: f64, shadowing_loss_db: f64, penetration_loss_db: f64) -> f64 {
    path_loss_db + shadowing_loss_db + penetration_loss_db
}

/// Transmit power available to each layer
pub fn tx_power_per_layer_dbm(total_tx_power_dbm: f64, num_layers: u32) -> Result<f64, LayerError> {
    if num_layers == 0 {
        return Err(LayerError::UndefinedOperation(
            "cannot split transmit power across zero layers".into(),
        ));
    }
    Ok(total_tx_power_dbm - 10.0 * (num_layers as f64).log10())
}

/// Received power per layer after loss and beamforming gain
pub fn rx_power_per_layer_dbm(tx_power_per_layer_dbm: f64, total_loss_db: f64, beamforming_gain_db: f64) -> f64 {
    tx_power_per_layer_dbm - total_loss_db + beamforming_gain_db
}

/// Thermal noise power k*T*B in Watts.
///
/// Non-positive temperature or bandwidth yields zero or negative noise;
/// callers validate first.
pub fn thermal_noise_power_w(temperature_k: f64, bandwidth_hz: f64) -> f64 {
    BOLTZMANN_CONSTANT * temperature_k * bandwidth_hz
}

/// Linear SNR from received power in dBm and noise power in Watts
pub fn snr_linear(rx_power_dbm: f64, thermal_noise_w: f64) -> f64 {
    dbm_to_watts(rx_power_dbm) / thermal_noise_w
}

impl LinkBudgetInputs {
    /// Reject inputs that would make the budget undefined
    pub fn validate(&self) -> Result<(), LayerError> {
        if self.num_layers == 0 {
            return Err(LayerError::InvalidInput("layer count must be positive".into()));
        }
        if !(self.bandwidth_hz > 0.0) || !self.bandwidth_hz.is_finite() {
            return Err(LayerError::InvalidInput(format!(
                "bandwidth must be positive, got {} Hz", self.bandwidth_hz
            )));
        }
        if !(self.temperature_k > 0.0) || !self.temperature_k.is_finite() {
            return Err(LayerError::InvalidInput(format!(
                "temperature must be positive, got {} K", self.temperature_k
            )));
        }

        let powers = [
            ("path loss", self.path_loss_db),
            ("shadowing loss", self.shadowing_loss_db),
            ("penetration loss", self.penetration_loss_db),
            ("transmit power", self.tx_power_dbm),
            ("beamforming gain", self.beamforming_gain_db),
        ];
        if let Some((name, value)) = powers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(LayerError::InvalidInput(format!("{} is not finite: {}", name, value)));
        }

        Ok(())
    }

    /// Run the full link budget
    pub fn estimate(&self) -> Result<LinkBudgetResult, LayerError> {
        self.validate()?;

        let total_loss_db = total_loss_db(
            self.path_loss_db,
            self.shadowing_loss_db,
            self.penetration_loss_db,
        );
        let tx_power_per_layer_dbm = tx_power_per_layer_dbm(self.tx_power_dbm, self.num_layers)?;
        let rx_power_per_layer_dbm =
            rx_power_per_layer_dbm(tx_power_per_layer_dbm, total_loss_db, self.beamforming_gain_db);
        let thermal_noise_w = thermal_noise_power_w(self.temperature_k, self.bandwidth_hz);
        let snr_linear = snr_linear(rx_power_per_layer_dbm, thermal_noise_w);

        debug!(
            "Link budget: loss={:.2} dB, tx/layer={:.2} dBm, rx/layer={:.2} dBm, noise={:.3e} W, snr={:.3}",
            total_loss_db, tx_power_per_layer_dbm, rx_power_per_layer_dbm, thermal_noise_w, snr_linear
        );

        Ok(LinkBudgetResult {
            total_loss_db,
            tx_power_per_layer_dbm,
            rx_power_per_layer_dbm,
            rx_power_per_layer_w: dbm_to_watts(rx_power_per_layer_dbm),
            thermal_noise_w,
            snr_linear,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> LinkBudgetInputs {
        LinkBudgetInputs {
            path_loss_db: 100.0,
            shadowing_loss_db: 10.0,
            penetration_loss_db: 5.0,
            tx_power_dbm: 40.0,
            num_layers: 2,
            beamforming_gain_db: 0.0,
            temperature_k: 300.0,
            bandwidth_hz: 100e6,
        }
    }

    #[test]
    fn test_total_loss() {
        assert_eq!(total_loss_db(100.0, 10.0, 5.0), 115.0);
        assert_eq!(total_loss_db(80.5, 20.0, 1.5), 102.0);
    }

    #[test]
    fn test_tx_power_per_layer() {
        assert_eq!(tx_power_per_layer_dbm(30.0, 1).unwrap(), 30.0);
        assert!((tx_power_per_layer_dbm(30.0, 2).unwrap() - 27.0).abs() < 0.1);
        assert!((tx_power_per_layer_dbm(30.0, 4).unwrap() - 24.0).abs() < 0.1);
        assert!(matches!(
            tx_power_per_layer_dbm(30.0, 0),
            Err(LayerError::UndefinedOperation(_))
        ));
    }

    #[test]
    fn test_rx_power_per_layer() {
        assert_eq!(rx_power_per_layer_dbm(30.0, 10.0, 5.0), 25.0);
        assert_eq!(rx_power_per_layer_dbm(50.0, 20.0, 10.0), 40.0);
    }

    #[test]
    fn test_thermal_noise() {
        let expected = 1.38e-23 * 300.0 * 1e9;
        assert!((thermal_noise_power_w(300.0, 1e9) - expected).abs() < 1e-20);
    }

    #[test]
    fn test_snr_linear() {
        // 30 dBm is 1 W
        let snr = snr_linear(30.0, 1e-9);
        assert!((snr - 1e9).abs() / 1e9 < 1e-9);
    }

    #[test]
    fn test_estimate() {
        let result = inputs().estimate().unwrap();
        assert_eq!(result.total_loss_db, 115.0);
        assert!((result.tx_power_per_layer_dbm - (40.0 - 10.0 * 2f64.log10())).abs() < 1e-12);
        assert!((result.rx_power_per_layer_dbm - (result.tx_power_per_layer_dbm - 115.0)).abs() < 1e-12);
        assert!(result.snr_linear > 0.0);
        assert!((result.snr_linear - result.rx_power_per_layer_w / result.thermal_noise_w).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut bad = inputs();
        bad.bandwidth_hz = 0.0;
        assert!(matches!(bad.estimate(), Err(LayerError::InvalidInput(_))));

        let mut bad = inputs();
        bad.temperature_k = -1.0;
        assert!(matches!(bad.estimate(), Err(LayerError::InvalidInput(_))));

        let mut bad = inputs();
        bad.num_layers = 0;
        assert!(matches!(bad.estimate(), Err(LayerError::InvalidInput(_))));

        let mut bad = inputs();
        bad.path_loss_db = f64::NAN;
        assert!(matches!(bad.estimate(), Err(LayerError::InvalidInput(_))));
    }
}

//! Shannon-Hartley bounds

use crate::LayerError;

/// Continuous spectral efficiency per layer, log2(1 + SNR) in bits/s/Hz
pub fn spectral_efficiency(snr_linear: f64) -> Result<f64, LayerError> {
    if !(snr_linear >= 0.0) || !snr_linear.is_finite() {
        return Err(LayerError::InvalidInput(format!(
            "SNR must be a non-negative finite ratio, got {}", snr_linear
        )));
    }
    Ok((1.0 + snr_linear).log2())
}

/// Shannon capacity B * log2(1 + SNR) in bits/s
pub fn shannon_capacity(bandwidth_hz: f64, snr_linear: f64) -> Result<f64, LayerError> {
    if !(bandwidth_hz > 0.0) {
        return Err(LayerError::InvalidInput(format!(
            "bandwidth must be positive, got {} Hz", bandwidth_hz
        )));
    }
    Ok(bandwidth_hz * spectral_efficiency(snr_linear)?)
}

/// Area traffic capacity in bits/s/km^2
pub fn area_traffic_capacity(
    spectral_efficiency: f64,
    cell_density_per_km2: f64,
    bandwidth_hz: f64,
) -> Result<f64, LayerError> {
    let inputs = [
        ("spectral efficiency", spectral_efficiency),
        ("cell density", cell_density_per_km2),
        ("bandwidth", bandwidth_hz),
    ];
    if let Some((name, value)) = inputs.iter().find(|(_, v)| !(*v >= 0.0)) {
        return Err(LayerError::InvalidInput(format!("{} must be non-negative, got {}", name, value)));
    }
    Ok(spectral_efficiency * cell_density_per_km2 * bandwidth_hz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectral_efficiency() {
        let se = spectral_efficiency(1000.0).unwrap();
        assert!((se - 1001f64.log2()).abs() < 1e-12);
        assert!((se - 9.968).abs() < 1e-3);

        assert_eq!(spectral_efficiency(0.0).unwrap(), 0.0);
        assert!(spectral_efficiency(-0.5).is_err());
        assert!(spectral_efficiency(f64::NAN).is_err());
        assert!(spectral_efficiency(f64::INFINITY).is_err());
    }

    #[test]
    fn test_shannon_capacity() {
        // 1 MHz at SNR 3 carries 2 Mbps
        assert!((shannon_capacity(1e6, 3.0).unwrap() - 2e6).abs() < 1e-6);
        assert!(shannon_capacity(0.0, 3.0).is_err());
        assert!(shannon_capacity(1e6, -1.0).is_err());
    }

    #[test]
    fn test_area_traffic_capacity() {
        assert_eq!(area_traffic_capacity(5.0, 10.0, 20e6).unwrap(), 1e9);
        assert!(area_traffic_capacity(-1.0, 10.0, 20e6).is_err());
        assert!(area_traffic_capacity(5.0, f64::NAN, 20e6).is_err());
    }
}

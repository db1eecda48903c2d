// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Intensity-Map Statistics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Summary statistics of a deposited-intensity map on the target sphere.
//!
//! Maps are equal-area pixel values in W/cm^2, so the plain mean is the
//! surface-averaged intensity.

use beam_types::constants::NOMINAL_DRIVE_TW_PER_BEAM;
use beam_types::error::{BeamError, BeamResult};
use ndarray::{Array1, ArrayView1};
use std::f64::consts::PI;
use tracing::info;

const UM_TO_CM: f64 = 1.0e-4;
const W_TO_TW: f64 = 1.0e-12;

/// `map / mean - 1` and the mean.
pub fn imap_norm(intensity_map: ArrayView1<f64>) -> BeamResult<(Array1<f64>, f64)> {
    let avg = intensity_map
        .mean()
        .ok_or_else(|| BeamError::ConfigError("Intensity map is empty".to_string()))?;
    if !avg.is_finite() || avg == 0.0 {
        return Err(BeamError::ConfigError(format!(
            "Intensity map mean {avg} cannot normalize the map"
        )));
    }
    Ok((intensity_map.mapv(|v| v / avg - 1.0), avg))
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntensityReadout {
    /// [TW]
    pub total_power: f64,
    /// [TW]
    pub power_per_beam: f64,
    /// Deposited power against the nominal drive [%].
    pub drive_efficiency: f64,
    /// Root-mean-square of the normalized map [%].
    pub rms: f64,
    /// Signed per-pixel deviation from the mean [%].
    pub rms_spatial: Array1<f64>,
}

/// Deposited power and uniformity of `intensity_map`.
pub fn readout_intensity(
    intensity_map: ArrayView1<f64>,
    target_radius_um: f64,
    beam_count: usize,
) -> BeamResult<IntensityReadout> {
    if beam_count == 0 {
        return Err(BeamError::ConfigError("beam_count must be > 0".to_string()));
    }
    let (normalized, avg) = imap_norm(intensity_map)?;
    let r_cm = target_radius_um * UM_TO_CM;
    let surface_area = 4.0 * PI * r_cm * r_cm;
    let total_power = avg * W_TO_TW * surface_area;
    let power_per_beam = total_power / beam_count as f64;
    let drive_efficiency =
        total_power / (beam_count as f64 * NOMINAL_DRIVE_TW_PER_BEAM) * 100.0;
    let rms = 100.0 * normalized.mapv(|v| v * v).mean().unwrap_or(0.0).sqrt();
    let rms_spatial = normalized.mapv(|v| 100.0 * v);

    info!(
        total_tw = total_power,
        per_beam_tw = power_per_beam,
        efficiency_pct = drive_efficiency,
        rms_pct = rms,
        beams = beam_count,
        "intensity readout"
    );

    Ok(IntensityReadout {
        total_power,
        power_per_beam,
        drive_efficiency,
        rms,
        rms_spatial,
    })
}

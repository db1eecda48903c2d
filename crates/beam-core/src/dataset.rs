// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Training-Target Encoding
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Discrete grid indices to a normalized parameter vector.

use beam_types::error::{BeamError, BeamResult};
use ndarray::{concatenate, Array1, ArrayView1, Axis};

/// Grid sizes used to normalize each parameter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetNorms {
    pub pointing_nside: usize,
    pub num_defocus: usize,
    pub num_powers: usize,
}

fn scaled(indices: ArrayView1<f64>, n: usize, what: &str) -> BeamResult<Array1<f64>> {
    if n < 2 {
        return Err(BeamError::ConfigError(format!(
            "{what} grid needs at least 2 points, got {n}"
        )));
    }
    let denom = (n - 1) as f64;
    if let Some(bad) = indices.iter().find(|&&i| !(0.0..=denom).contains(&i)) {
        return Err(BeamError::ConfigError(format!(
            "{what} index {bad} outside grid 0..={}",
            n - 1
        )));
    }
    Ok(indices.mapv(|i| i / denom))
}

/// Stack pointing, defocus and power indices into one `[0, 1]` vector.
///
/// Each family is divided by its grid size minus one, in the order
/// pointing, defocus, power.
pub fn create_ytrain(
    pointing_per_cone: ArrayView1<f64>,
    norms: TargetNorms,
    defocus_per_cone: ArrayView1<f64>,
    power_per_cone: ArrayView1<f64>,
) -> BeamResult<(Array1<f64>, TargetNorms)> {
    let pointing = scaled(pointing_per_cone, norms.pointing_nside, "pointing")?;
    let defocus = scaled(defocus_per_cone, norms.num_defocus, "defocus")?;
    let power = scaled(power_per_cone, norms.num_powers, "power")?;
    let y = concatenate(Axis(0), &[pointing.view(), defocus.view(), power.view()])
        .map_err(|e| BeamError::ConfigError(format!("cannot stack targets: {e}")))?;
    Ok((y, norms))
}

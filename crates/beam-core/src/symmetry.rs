// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Hemisphere Symmetry and Beam Drive
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Lower-hemisphere phase folding and per-cone power/defocus.

use beam_types::config::PointingConfig;
use beam_types::state::FacilitySpec;
use std::f64::consts::PI;

/// True for cone slots past the equator in `quad_from_each_cone` order.
///
/// Slot `i` is lower when `i > trunc(cone_count / 2 - 1)`.
pub fn is_lower_cone(icone: usize, cone_count: usize) -> bool {
    let last_upper = (cone_count as f64 / 2.0 - 1.0).trunc();
    icone as f64 > last_upper
}

/// Fold a lower-hemisphere offset azimuth.
///
/// Symmetric facilities mirror (`pi - phi`); others rotate by half a turn.
pub fn fold_offset_phi(offset_phi: f64, hemisphere_symmetric: bool) -> f64 {
    if hemisphere_symmetric {
        PI - offset_phi
    } else {
        (offset_phi + PI).rem_euclid(2.0 * PI)
    }
}

/// Azimuth used for cone slot `icone`.
pub fn resolve_offset_phi(
    offset_phi: f64,
    icone: usize,
    cone_count: usize,
    hemisphere_symmetric: bool,
) -> f64 {
    if is_lower_cone(icone, cone_count) {
        fold_offset_phi(offset_phi, hemisphere_symmetric)
    } else {
        offset_phi
    }
}

/// Power fraction: `[0, 1]` mapped onto `[min_power, 1]`.
pub fn cone_power(power_norm: f64, min_power: f64) -> f64 {
    power_norm * (1.0 - min_power) + min_power
}

/// Defocus of a cone [mm].
pub fn cone_defocus(config: &PointingConfig, cone_params: &[f64]) -> f64 {
    if config.defocus_bool {
        cone_params[config.defocus_index] * config.defocus_range
    } else {
        config.defocus_default
    }
}

/// Physical drive of every beam in one cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeDrive {
    pub power_fraction: f64,
    /// [TW] per simulated beam.
    pub p0: f64,
    /// [mm]
    pub defocus: f64,
}

pub fn resolve_drive(spec: &FacilitySpec, config: &PointingConfig, cone_params: &[f64]) -> ConeDrive {
    let power_fraction = cone_power(cone_params[config.power_index], config.min_power);
    ConeDrive {
        power_fraction,
        p0: spec.default_power * power_fraction * spec.beams_per_ifriit_beam as f64,
        defocus: cone_defocus(config, cone_params),
    }
}

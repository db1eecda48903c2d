// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Per-Example Beam Pointing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One normalized parameter vector to per-beam pointing, power and defocus.

use crate::geometry::{cone_offset, point_quad, pointing_angles};
use crate::symmetry::{resolve_drive, resolve_offset_phi};
use beam_types::config::PointingConfig;
use beam_types::error::{BeamError, BeamResult};
use beam_types::state::{FacilitySpec, PointingResult};

/// Pointing of one example together with its physical cone parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamplePointing {
    pub result: PointingResult,
    /// `cone_count * num_sim_params` physical values: offset theta [rad],
    /// folded offset phi [rad], defocus [mm] (zero when fixed) and power
    /// fraction, at the configured indices of each cone block.
    pub sim_params: Vec<f64>,
}

/// Parameters of cone slot `icone`, wrapping modulo the vector length.
///
/// A vector holding one hemisphere's cones drives both hemispheres.
pub fn cone_slice(params: &[f64], icone: usize, num_sim_params: usize) -> &[f64] {
    let n = params.len();
    let lo = (icone * num_sim_params) % n;
    let hi = ((icone + 1) * num_sim_params - 1) % n + 1;
    &params[lo..hi]
}

/// Check that `params` can be sliced into cones.
pub fn check_layout(params_len: usize, config: &PointingConfig) -> BeamResult<()> {
    if params_len == 0 || params_len % config.num_sim_params != 0 {
        return Err(BeamError::ConfigError(format!(
            "Parameter vector of length {params_len} is not a positive multiple of \
             num_sim_params={}",
            config.num_sim_params
        )));
    }
    Ok(())
}

fn check_example(example: usize, params: &[f64]) -> BeamResult<()> {
    for (idx, &v) in params.iter().enumerate() {
        if !v.is_finite() || !(0.0..=1.0).contains(&v) {
            return Err(BeamError::GeometryError {
                example,
                message: format!("normalized parameter {idx} = {v} lies outside [0, 1]"),
            });
        }
    }
    Ok(())
}

/// Compute pointings for example `example` from its normalized vector.
pub fn compute_example(
    spec: &FacilitySpec,
    config: &PointingConfig,
    example: usize,
    params: &[f64],
) -> BeamResult<ExamplePointing> {
    config.validate()?;
    if spec.grouping.cones.len() != spec.cone_count {
        return Err(BeamError::ConfigError(format!(
            "Facility has {} cone groups for cone_count={}",
            spec.grouping.cones.len(),
            spec.cone_count
        )));
    }
    check_layout(params.len(), config)?;
    check_example(example, params)?;

    let nsp = config.num_sim_params;
    let mut result = PointingResult::zeros(spec.table.len(), spec.default_fuse());
    let mut sim_params = vec![0.0; spec.cone_count * nsp];

    for (icone, cone) in spec.grouping.cones.iter().enumerate() {
        let cone_params = cone_slice(params, icone, nsp);
        let mut offset = cone_offset(
            cone_params[config.theta_index],
            cone_params[config.phi_index],
            config.surface_cover_radians,
        )
        .ok_or_else(|| BeamError::GeometryError {
            example,
            message: format!("cone {icone} maps outside the unit disk"),
        })?;
        offset.offset_phi = resolve_offset_phi(
            offset.offset_phi,
            icone,
            spec.cone_count,
            config.hemisphere_symmetric,
        );
        let drive = resolve_drive(spec, config, cone_params);

        let block = &mut sim_params[icone * nsp..(icone + 1) * nsp];
        block[config.theta_index] = offset.offset_theta;
        block[config.phi_index] = offset.offset_phi;
        if config.defocus_bool {
            block[config.defocus_index] = drive.defocus;
        }
        block[config.power_index] = drive.power_fraction;

        for quad in &cone.quads {
            let coord = point_quad(spec.target_radius, quad.port_theta, quad.port_phi, &offset);
            let (theta, phi) = pointing_angles(&coord, spec.target_radius);
            for &row in &quad.rows {
                result.coord_n[row] = coord;
                result.theta_pointing[row] = theta;
                result.phi_pointing[row] = phi;
                result.defocus[row] = drive.defocus;
                result.p0[row] = drive.p0;
            }
        }
    }

    Ok(ExamplePointing { result, sim_params })
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Beam Pointing Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Normalized cone parameters to chamber pointing positions.
//!
//! A cone's (theta, phi) parameter pair is mapped from `[0, 1]^2` to
//! `[-1, 1]^2`, then through the concentric square-to-disk map to a polar
//! offset around the port axis. The offset is applied in the port frame
//! and the result rotated onto the port:
//!
//! `p = Rz(port_phi) Ry(port_theta) Rz(offset_phi) Ry(offset_theta) (0, 0, R)`

use beam_math::disk::square_to_disk;
use beam_math::rotation::{mat_mul, mat_vec, rot_mat, spherical_angles, Axis, Mat3, Vec3};

/// Polar offset of a cone's pointing from its port axis [rad].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeOffset {
    /// Disk radius in `[0, 1]` before scaling.
    pub radius: f64,
    pub offset_theta: f64,
    pub offset_phi: f64,
}

/// Map a normalized `(theta, phi)` parameter pair to a polar offset.
///
/// Returns `None` for non-finite parameters and when the disk radius
/// exceeds 1, which only happens for parameters outside `[0, 1]`.
pub fn cone_offset(theta_norm: f64, phi_norm: f64, surface_cover_radians: f64) -> Option<ConeOffset> {
    let x = theta_norm * 2.0 - 1.0;
    let y = phi_norm * 2.0 - 1.0;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let (radius, offset_phi) = square_to_disk(x, y);
    if !radius.is_finite() || !offset_phi.is_finite() || radius > 1.0 {
        return None;
    }
    Some(ConeOffset {
        radius,
        offset_theta: radius * surface_cover_radians,
        offset_phi,
    })
}

/// Combined port-and-offset rotation.
pub fn pointing_rotation(port_theta: f64, port_phi: f64, offset: &ConeOffset) -> Mat3 {
    let port = mat_mul(&rot_mat(port_phi, Axis::Z), &rot_mat(port_theta, Axis::Y));
    let local = mat_mul(
        &rot_mat(offset.offset_phi, Axis::Z),
        &rot_mat(offset.offset_theta, Axis::Y),
    );
    mat_mul(&port, &local)
}

/// Pointing position on a sphere of `target_radius` for one quad.
pub fn point_quad(target_radius: f64, port_theta: f64, port_phi: f64, offset: &ConeOffset) -> Vec3 {
    let rotation = pointing_rotation(port_theta, port_phi, offset);
    mat_vec(&rotation, &[0.0, 0.0, target_radius])
}

/// `(theta, phi)` of a pointing position [rad].
pub fn pointing_angles(coord: &Vec3, target_radius: f64) -> (f64, f64) {
    spherical_angles(coord, target_radius)
}

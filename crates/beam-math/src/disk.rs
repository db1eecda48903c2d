//! Concentric square-to-disk mapping (Shirley & Chiu, 1997).
//!
//! Maps `[-1, 1]^2` onto the unit disk, area-preserving up to a constant,
//! with squares of side `2r` landing on circles of radius `r`.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Map a point of `[-1, 1]^2` to polar disk coordinates `(r, phi)`.
///
/// `r` is in `[0, 1]` for inputs in the square, `phi` in `[0, 2*pi)`.
/// The origin maps to `(0, 0)`.
pub fn square_to_disk(x: f64, y: f64) -> (f64, f64) {
    if x == 0.0 && y == 0.0 {
        return (0.0, 0.0);
    }
    let (mut r, mut phi) = if x.abs() > y.abs() {
        (x, FRAC_PI_4 * (y / x))
    } else {
        (y, FRAC_PI_2 - FRAC_PI_4 * (x / y))
    };
    if r < 0.0 {
        r = -r;
        phi += PI;
    }
    let phi = phi.rem_euclid(2.0 * PI);
    // rem_euclid rounds tiny negative angles up to exactly 2*pi.
    (r, if phi >= 2.0 * PI { 0.0 } else { phi })
}

/// Inverse of [`square_to_disk`]. Any `phi` is accepted; `r = 0` gives the origin.
pub fn disk_to_square(r: f64, phi: f64) -> (f64, f64) {
    if r == 0.0 {
        return (0.0, 0.0);
    }
    // Shift into [-pi/4, 7pi/4) so each quarter maps to one square edge.
    let phi = (phi + FRAC_PI_4).rem_euclid(2.0 * PI) - FRAC_PI_4;
    if phi < FRAC_PI_4 {
        (r, r * phi / FRAC_PI_4)
    } else if phi < 3.0 * FRAC_PI_4 {
        (r * (FRAC_PI_2 - phi) / FRAC_PI_4, r)
    } else if phi < 5.0 * FRAC_PI_4 {
        (-r, -r * (phi - PI) / FRAC_PI_4)
    } else {
        (-r * (3.0 * FRAC_PI_2 - phi) / FRAC_PI_4, -r)
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Beam Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Port-theta window used to collect the quads of one cone [deg].
/// Must separate a cone from its same-named mirror in the other hemisphere.
pub const CONE_GROUPING_TOLERANCE_DEG: f64 = 5.0;

/// Third-harmonic laser wavelength [nm].
pub const LAMBDA_NM: f64 = 1052.85 / 3.0;

/// Name of the deck file inside each run directory.
pub const DECK_FILE_NAME: &str = "ifriit_inputs.txt";

/// Fortran double-precision suffix appended to every float literal.
pub const FORTRAN_DOUBLE_SUFFIX: &str = "d0";

/// Final deck line. The simulator's namelist reader rejects a blank last line.
pub const DECK_TRAILER: &str = "! Last line must not be empty";

/// Focal length written in `test` decks [m].
pub const TEST_FOCAL_M: &str = "10.0d0";

/// Super-Gaussian order written in `test` decks.
pub const TEST_SUPER_GAUSSIAN_ORDER: u32 = 6;

/// Spot-shape law written in `test` decks.
pub const TEST_SPOT_LAW: u32 = 2;

/// Spot radii written in `test` decks [um].
pub const TEST_SPOT_RADIUS_UM: &str = "80.0d0";

/// Nominal drive per beam used for the efficiency readout [TW].
pub const NOMINAL_DRIVE_TW_PER_BEAM: f64 = 0.25;

// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — IFRIIT Deck Writer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! `ifriit_inputs.txt` generation.
//!
//! A deck is the template namelist header (with `NBEAMS` and
//! `DIAGNOSE_INPUT_BEAMS_RADIUS_UM` rewritten) followed by one `&BEAM`
//! record per simulated beam in beam-table order and a non-blank trailer.
//! Field order and spacing are fixed by the simulator's namelist reader.

use beam_types::config::RunType;
use beam_types::constants::{
    DECK_FILE_NAME, DECK_TRAILER, FORTRAN_DOUBLE_SUFFIX, LAMBDA_NM, TEST_FOCAL_M,
    TEST_SPOT_LAW, TEST_SPOT_RADIUS_UM, TEST_SUPER_GAUSSIAN_ORDER,
};
use beam_types::error::{BeamError, BeamResult};
use beam_types::state::{FacilitySpec, PointingResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckFacility {
    /// One record per beam, keyed by beam id.
    Nif,
    /// One record per fused quad, keyed by quad id.
    Lmj,
}

/// Fields written after the power line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamFields {
    /// Facility-predefined beam and phase plate.
    Predefined,
    /// Explicit port angles and generic spot (`test` runs).
    Explicit,
    /// Run type names another facility: pointing and power only.
    Omitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckLayout {
    pub facility: DeckFacility,
    pub fields: BeamFields,
}

impl DeckLayout {
    /// Select the renderer for a facility name and run type.
    pub fn resolve(facility: &str, run_type: RunType) -> BeamResult<Self> {
        let facility = match facility {
            "NIF" => DeckFacility::Nif,
            "LMJ" => DeckFacility::Lmj,
            other => return Err(BeamError::UnsupportedFacility(other.to_string())),
        };
        let fields = match (facility, run_type) {
            (_, RunType::Test) => BeamFields::Explicit,
            (DeckFacility::Nif, RunType::Nif) | (DeckFacility::Lmj, RunType::Lmj) => {
                BeamFields::Predefined
            }
            _ => BeamFields::Omitted,
        };
        Ok(DeckLayout { facility, fields })
    }
}

/// NIF phase-plate family by cone angle [deg].
pub fn nif_cpp(cone_id: f64) -> &'static str {
    if cone_id == 23.5 {
        "inner-23"
    } else if cone_id == 30.0 {
        "inner-30"
    } else if cone_id == 44.5 {
        "outer-44"
    } else {
        "outer-50"
    }
}

const LMJ_CPP: &str = "LMJ-A";

fn d0(v: f64) -> String {
    format!("{v:.10}{FORTRAN_DOUBLE_SUFFIX}")
}

/// Rewrite the beam-count and diagnostic-radius lines of the template.
pub fn render_header(template: &str, spec: &FacilitySpec) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    for line in template.split_inclusive('\n') {
        if line.contains("NBEAMS") {
            out.push_str(&format!(
                "    NBEAMS                      = {},\n",
                spec.num_ifriit_beams()
            ));
        } else if line.contains("DIAGNOSE_INPUT_BEAMS_RADIUS_UM") {
            out.push_str(&format!(
                "    DIAGNOSE_INPUT_BEAMS_RADIUS_UM = {:?}{FORTRAN_DOUBLE_SUFFIX},\n",
                spec.target_radius
            ));
        } else {
            out.push_str(line);
        }
    }
    out
}

/// Write every `&BEAM` record and the trailer.
///
/// `t0` switches power from `P0_TW` to per-beam pulse files.
pub fn render_beams<W: Write>(
    out: &mut W,
    layout: DeckLayout,
    spec: &FacilitySpec,
    result: &PointingResult,
    t0: Option<f64>,
) -> BeamResult<()> {
    let records = spec.table.records();
    result.check_lengths()?;
    if result.len() != records.len() {
        return Err(BeamError::ConfigError(format!(
            "Pointing result has {} beams, facility table has {}",
            result.len(),
            records.len()
        )));
    }
    let g = &spec.grouping;
    if g.port_centre_theta.len() != records.len() || g.port_centre_phi.len() != records.len() {
        return Err(BeamError::ConfigError(format!(
            "Port centres cover {}/{} beams, facility table has {}",
            g.port_centre_theta.len(),
            g.port_centre_phi.len(),
            records.len()
        )));
    }
    let facility_name = match layout.facility {
        DeckFacility::Nif => "NIF",
        DeckFacility::Lmj => "LMJ",
    };

    for (j, rec) in records.iter().enumerate() {
        let id = match layout.facility {
            DeckFacility::Nif => &rec.beam_id,
            DeckFacility::Lmj => &rec.quad_id,
        };
        let [x, y, z] = result.coord_n[j];

        writeln!(out, "&BEAM")?;
        writeln!(out, "    LAMBDA_NM           = {},", d0(LAMBDA_NM))?;
        writeln!(out, "    FOC_UM              = {},{},{},", d0(x), d0(y), d0(z))?;
        match t0 {
            Some(t0) => {
                writeln!(out, "    POWER_PROFILE_FILE_TW_NS = \"pulse_{id}.txt\"")?;
                writeln!(out, "    T_0_NS              = {},", d0(t0))?;
            }
            None => writeln!(out, "    P0_TW               = {},", d0(result.p0[j]))?,
        }

        match layout.fields {
            BeamFields::Predefined => {
                let cpp = match layout.facility {
                    DeckFacility::Nif => format!("NIF-{}", nif_cpp(rec.cone_id)),
                    DeckFacility::Lmj => LMJ_CPP.to_string(),
                };
                writeln!(out, "    PREDEF_FACILITY     = \"{facility_name}\"")?;
                writeln!(out, "    PREDEF_BEAM         = \"{id}\",")?;
                writeln!(out, "    PREDEF_CPP          = \"{cpp}\",")?;
                writeln!(out, "    CPP_ROTATION_MODE   = 1,")?;
                writeln!(out, "    DEFOCUS_MM          = {},", d0(result.defocus[j]))?;
            }
            BeamFields::Explicit => {
                let theta = spec.grouping.port_centre_theta[j].to_degrees();
                let phi = spec.grouping.port_centre_phi[j].to_degrees();
                writeln!(out, "    THETA_DEG            = {},", d0(theta))?;
                writeln!(out, "    PHI_DEG              = {},", d0(phi))?;
                writeln!(out, "    FOCAL_M             = {TEST_FOCAL_M},")?;
                writeln!(out, "    SG                  = {TEST_SUPER_GAUSSIAN_ORDER},")?;
                writeln!(out, "    LAW                  = {TEST_SPOT_LAW},")?;
                writeln!(out, "    RAD_1_UM            = {TEST_SPOT_RADIUS_UM},")?;
                writeln!(out, "    RAD_2_UM            = {TEST_SPOT_RADIUS_UM},")?;
            }
            BeamFields::Omitted => {}
        }

        if layout.facility == DeckFacility::Nif {
            if result.fuse[j] {
                writeln!(out, "    FUSE_QUADS          = .TRUE.,")?;
                writeln!(out, "    FUSE_BY_POINTINGS   = .TRUE.,")?;
            } else {
                writeln!(out, "    FUSE_QUADS          = .FALSE.,")?;
            }
            if let Some(mispoint) = &result.xy_mispoint {
                let [mx, my] = mispoint[j];
                writeln!(out, "    XY_MISPOINT_UM      = {},{},", d0(mx), d0(my))?;
            }
        }
        writeln!(out, "/")?;
        writeln!(out)?;
    }
    writeln!(out)?;
    write!(out, "{DECK_TRAILER}")?;
    Ok(())
}

/// Full deck text: rewritten header, beam records, trailer.
pub fn render_deck(
    template: &str,
    layout: DeckLayout,
    spec: &FacilitySpec,
    result: &PointingResult,
    t0: Option<f64>,
) -> BeamResult<String> {
    let mut buf = render_header(template, spec).into_bytes();
    render_beams(&mut buf, layout, spec, result, t0)?;
    String::from_utf8(buf)
        .map_err(|e| BeamError::ConfigError(format!("Deck is not valid UTF-8: {e}")))
}

/// Write `ifriit_inputs.txt` into `run_dir`.
///
/// The deck is assembled in a temporary file beside the target and renamed
/// into place, so a failed write never leaves a truncated deck behind.
pub fn write_deck(
    run_dir: &Path,
    template: &str,
    layout: DeckLayout,
    spec: &FacilitySpec,
    result: &PointingResult,
    t0: Option<f64>,
) -> BeamResult<PathBuf> {
    let text = render_deck(template, layout, spec, result, t0)?;
    std::fs::create_dir_all(run_dir)?;
    let target = run_dir.join(DECK_FILE_NAME);
    let mut tmp = tempfile::Builder::new()
        .prefix(".ifriit_inputs")
        .suffix(".partial")
        .tempfile_in(run_dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| BeamError::Io(e.error))?;
    debug!(path = %target.display(), beams = result.len(), "deck written");
    Ok(target)
}

/// Resolve the layout from a facility name, then write the deck.
///
/// Unknown facilities fail before anything touches the filesystem.
pub fn generate_deck(
    facility: &str,
    run_type: RunType,
    run_dir: &Path,
    template: &str,
    spec: &FacilitySpec,
    result: &PointingResult,
    t0: Option<f64>,
) -> BeamResult<PathBuf> {
    let layout = DeckLayout::resolve(facility, run_type)?;
    write_deck(run_dir, template, layout, spec, result, t0)
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Beam State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{BeamError, BeamResult};

/// One row of a facility beam table.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamRecord {
    pub beam_id: String,
    pub quad_id: String,
    /// Cone name, the nominal cone angle in degrees (e.g. 23.5, 44.5).
    pub cone_id: f64,
    /// Port polar angle [rad].
    pub theta: f64,
    /// Port azimuth [rad].
    pub phi: f64,
    /// Port radius code (`PR` column).
    pub port_radius: i64,
}

/// Beam table of one facility, upper hemisphere first.
/// Row `i` is simulated beam `i` everywhere downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamTable {
    records: Vec<BeamRecord>,
}

impl BeamTable {
    /// Rejects empty tables and non-finite angles.
    pub fn new(records: Vec<BeamRecord>) -> BeamResult<Self> {
        if records.is_empty() {
            return Err(BeamError::ConfigError("Beam table is empty".to_string()));
        }
        for (idx, rec) in records.iter().enumerate() {
            if !rec.theta.is_finite() || !rec.phi.is_finite() || !rec.cone_id.is_finite() {
                return Err(BeamError::ConfigError(format!(
                    "Beam table row {idx} ({}) contains non-finite angles",
                    rec.beam_id
                )));
            }
        }
        Ok(BeamTable { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[BeamRecord] {
        &self.records
    }

    pub fn get(&self, idx: usize) -> Option<&BeamRecord> {
        self.records.get(idx)
    }

    /// Row indices of every beam in `quad`, in table order.
    pub fn quad_rows(&self, quad: &str) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.quad_id == quad)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of rows carrying cone name `cone`.
    pub fn cone_count(&self, cone: f64) -> usize {
        self.records.iter().filter(|r| r.cone_id == cone).count()
    }
}

/// A quad and the port centre its beams share.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadGroup {
    pub quad_id: String,
    /// Beam-table rows of this quad.
    pub rows: Vec<usize>,
    /// Mean port theta over the quad's rows [rad].
    pub port_theta: f64,
    /// Mean port phi over the quad's rows [rad].
    pub port_phi: f64,
}

/// The quads driven by one slot of the parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeGroup {
    pub representative_quad: String,
    pub cone_id: f64,
    /// Same-named quads within the grouping tolerance of the representative.
    pub quads: Vec<QuadGroup>,
    /// Physical beams in this cone for one hemisphere.
    pub beams_per_cone: usize,
}

/// Cone -> quad -> beam index, built once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeGrouping {
    pub cones: Vec<ConeGroup>,
    /// Cone slot driving each beam-table row.
    pub cone_of_row: Vec<usize>,
    /// Quad port centre of each row [rad].
    pub port_centre_theta: Vec<f64>,
    pub port_centre_phi: Vec<f64>,
}

impl ConeGrouping {
    pub fn beams_per_cone(&self) -> Vec<usize> {
        self.cones.iter().map(|c| c.beams_per_cone).collect()
    }
}

/// Immutable description of a facility: constants, beam table, grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilitySpec {
    pub name: String,
    /// Physical beam count.
    pub beam_count: usize,
    /// [um]
    pub target_radius: f64,
    pub cone_count: usize,
    pub beams_per_ifriit_beam: usize,
    /// [TW] per physical beam.
    pub default_power: f64,
    pub quad_from_each_cone: Vec<String>,
    pub table: BeamTable,
    pub grouping: ConeGrouping,
}

impl FacilitySpec {
    /// Simulated beams, one per table row.
    pub fn num_ifriit_beams(&self) -> usize {
        self.beam_count / self.beams_per_ifriit_beam
    }

    /// Fuse flag used when an example does not override it.
    pub fn default_fuse(&self) -> bool {
        self.beams_per_ifriit_beam > 1
    }
}

/// Per-beam physical quantities for one example.
#[derive(Debug, Clone, PartialEq)]
pub struct PointingResult {
    /// Pointing position on the target chamber [um].
    pub coord_n: Vec<[f64; 3]>,
    pub theta_pointing: Vec<f64>,
    pub phi_pointing: Vec<f64>,
    /// [mm]
    pub defocus: Vec<f64>,
    /// [TW] per simulated beam.
    pub p0: Vec<f64>,
    pub fuse: Vec<bool>,
    /// Optional (x, y) mispointing [um].
    pub xy_mispoint: Option<Vec<[f64; 2]>>,
}

impl PointingResult {
    pub fn zeros(n: usize, fuse: bool) -> Self {
        PointingResult {
            coord_n: vec![[0.0; 3]; n],
            theta_pointing: vec![0.0; n],
            phi_pointing: vec![0.0; n],
            defocus: vec![0.0; n],
            p0: vec![0.0; n],
            fuse: vec![fuse; n],
            xy_mispoint: None,
        }
    }

    pub fn len(&self) -> usize {
        self.coord_n.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coord_n.is_empty()
    }

    /// Check that every per-beam array has `coord_n`'s length.
    pub fn check_lengths(&self) -> BeamResult<()> {
        let n = self.len();
        let fields = [
            ("theta_pointing", self.theta_pointing.len()),
            ("phi_pointing", self.phi_pointing.len()),
            ("defocus", self.defocus.len()),
            ("p0", self.p0.len()),
            ("fuse", self.fuse.len()),
        ];
        for (name, len) in fields {
            if len != n {
                return Err(BeamError::ConfigError(format!(
                    "{name} has {len} entries for {n} beams"
                )));
            }
        }
        if let Some(mispoint) = &self.xy_mispoint {
            if mispoint.len() != n {
                return Err(BeamError::ConfigError(format!(
                    "xy_mispoint has {} entries for {n} beams",
                    mispoint.len()
                )));
            }
        }
        Ok(())
    }

    /// Replace the facility-wide fuse flags.
    pub fn with_fuse(mut self, fuse: Vec<bool>) -> BeamResult<Self> {
        if fuse.len() != self.len() {
            return Err(BeamError::ConfigError(format!(
                "fuse override has {} entries for {} beams",
                fuse.len(),
                self.len()
            )));
        }
        self.fuse = fuse;
        Ok(self)
    }

    pub fn with_xy_mispoint(mut self, mispoint: Vec<[f64; 2]>) -> BeamResult<Self> {
        if mispoint.len() != self.len() {
            return Err(BeamError::ConfigError(format!(
                "xy mispoint has {} entries for {} beams",
                mispoint.len(),
                self.len()
            )));
        }
        self.xy_mispoint = Some(mispoint);
        Ok(self)
    }
}

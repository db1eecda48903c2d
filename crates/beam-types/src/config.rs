// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Beam Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{BeamError, BeamResult};
use serde::{Deserialize, Serialize};

/// Which beam fields a deck carries after the power line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    /// NIF predefined beams and phase plates.
    Nif,
    /// LMJ predefined quads and phase plates.
    Lmj,
    /// Explicit port angles and a generic super-Gaussian spot.
    Test,
}

impl std::str::FromStr for RunType {
    type Err = BeamError;

    fn from_str(s: &str) -> BeamResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nif" => Ok(RunType::Nif),
            "lmj" => Ok(RunType::Lmj),
            "test" => Ok(RunType::Test),
            other => Err(BeamError::ConfigError(format!("Unknown run type '{other}'"))),
        }
    }
}

/// Static facility constants plus the two hemisphere beam tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityConfig {
    pub facility: String,
    /// Physical beam count.
    pub nbeams: usize,
    /// Target radius [um].
    pub target_radius: f64,
    pub num_quads: usize,
    pub num_cones: usize,
    /// Power per physical beam [TW].
    pub default_power: f64,
    /// Representative quad per cone, top-to-equator then bottom-to-equator.
    pub quad_from_each_cone: Vec<String>,
    /// Physical beams fused into one simulated beam.
    pub beams_per_ifriit_beam: usize,
    pub upper_table: String,
    pub lower_table: String,
}

impl FacilityConfig {
    /// National Ignition Facility: 192 beams in 48 quads, 8 cones.
    pub fn nif() -> Self {
        FacilityConfig {
            facility: "NIF".to_string(),
            nbeams: 192,
            target_radius: 1100.0,
            num_quads: 48,
            num_cones: 8,
            default_power: 1.0,
            quad_from_each_cone: ["Q15T", "Q13T", "Q14T", "Q11T", "Q15B", "Q16B", "Q14B", "Q13B"]
                .iter()
                .map(|q| q.to_string())
                .collect(),
            beams_per_ifriit_beam: 1,
            upper_table: "NIF_UpperBeams.txt".to_string(),
            lower_table: "NIF_LowerBeams.txt".to_string(),
        }
    }

    /// Laser Megajoule: 80 beams in 20 quads, 4 cones, fused per quad.
    pub fn lmj() -> Self {
        FacilityConfig {
            facility: "LMJ".to_string(),
            nbeams: 80,
            target_radius: 1100.0,
            num_quads: 20,
            num_cones: 4,
            default_power: 1.0,
            quad_from_each_cone: ["28U", "10U", "10L", "28L"]
                .iter()
                .map(|q| q.to_string())
                .collect(),
            beams_per_ifriit_beam: 4,
            upper_table: "LMJ_UpperBeams.txt".to_string(),
            lower_table: "LMJ_LowerBeams.txt".to_string(),
        }
    }

    /// Built-in constants by facility name.
    pub fn builtin(name: &str) -> BeamResult<Self> {
        match name {
            "NIF" => Ok(Self::nif()),
            "LMJ" => Ok(Self::lmj()),
            other => Err(BeamError::UnsupportedFacility(other.to_string())),
        }
    }

    pub fn from_file(path: &str) -> BeamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of simulated ("ifriit") beams, one beam-table row each.
    pub fn num_ifriit_beams(&self) -> usize {
        self.nbeams / self.beams_per_ifriit_beam
    }

    pub fn validate(&self) -> BeamResult<()> {
        if self.beams_per_ifriit_beam == 0 {
            return Err(BeamError::ConfigError(
                "beams_per_ifriit_beam must be >= 1".to_string(),
            ));
        }
        if self.nbeams == 0 || self.nbeams % self.beams_per_ifriit_beam != 0 {
            return Err(BeamError::ConfigError(format!(
                "nbeams={} is not a positive multiple of beams_per_ifriit_beam={}",
                self.nbeams, self.beams_per_ifriit_beam
            )));
        }
        if self.num_ifriit_beams() % 2 != 0 {
            return Err(BeamError::ConfigError(format!(
                "{} simulated beams cannot be split into two hemispheres",
                self.num_ifriit_beams()
            )));
        }
        if self.num_cones == 0 || self.quad_from_each_cone.len() != self.num_cones {
            return Err(BeamError::ConfigError(format!(
                "quad_from_each_cone has {} entries, expected num_cones={}",
                self.quad_from_each_cone.len(),
                self.num_cones
            )));
        }
        if !self.target_radius.is_finite() || self.target_radius <= 0.0 {
            return Err(BeamError::ConfigError(format!(
                "target_radius must be finite and > 0, got {}",
                self.target_radius
            )));
        }
        if !self.default_power.is_finite() || self.default_power < 0.0 {
            return Err(BeamError::ConfigError(format!(
                "default_power must be finite and >= 0, got {}",
                self.default_power
            )));
        }
        Ok(())
    }
}

/// Layout of the normalized parameter vector and its physical scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointingConfig {
    /// Parameters per cone.
    #[serde(default = "default_num_sim_params")]
    pub num_sim_params: usize,
    #[serde(default = "default_theta_index")]
    pub theta_index: usize,
    #[serde(default = "default_phi_index")]
    pub phi_index: usize,
    #[serde(default = "default_defocus_index")]
    pub defocus_index: usize,
    #[serde(default = "default_power_index")]
    pub power_index: usize,
    /// Largest pointing offset from the port axis [rad].
    #[serde(default = "default_surface_cover_radians")]
    pub surface_cover_radians: f64,
    /// Mirror (true) or rotate by pi (false) the lower-hemisphere offsets.
    #[serde(default = "default_true")]
    pub hemisphere_symmetric: bool,
    /// Take defocus from the parameter vector instead of `defocus_default`.
    #[serde(default = "default_true")]
    pub defocus_bool: bool,
    /// [mm]
    #[serde(default = "default_defocus_range")]
    pub defocus_range: f64,
    /// [mm]
    #[serde(default)]
    pub defocus_default: f64,
    /// Lowest power fraction a normalized power of 0 maps to.
    #[serde(default = "default_min_power")]
    pub min_power: f64,
    #[serde(default = "default_run_type")]
    pub run_type: RunType,
}

fn default_num_sim_params() -> usize {
    4
}
fn default_theta_index() -> usize {
    0
}
fn default_phi_index() -> usize {
    1
}
fn default_defocus_index() -> usize {
    2
}
fn default_power_index() -> usize {
    3
}
fn default_surface_cover_radians() -> f64 {
    20.0_f64.to_radians()
}
fn default_true() -> bool {
    true
}
fn default_defocus_range() -> f64 {
    20.0
}
fn default_min_power() -> f64 {
    0.5
}
fn default_run_type() -> RunType {
    RunType::Nif
}

impl Default for PointingConfig {
    fn default() -> Self {
        PointingConfig {
            num_sim_params: default_num_sim_params(),
            theta_index: default_theta_index(),
            phi_index: default_phi_index(),
            defocus_index: default_defocus_index(),
            power_index: default_power_index(),
            surface_cover_radians: default_surface_cover_radians(),
            hemisphere_symmetric: true,
            defocus_bool: true,
            defocus_range: default_defocus_range(),
            defocus_default: 0.0,
            min_power: default_min_power(),
            run_type: default_run_type(),
        }
    }
}

impl PointingConfig {
    pub fn from_file(path: &str) -> BeamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BeamResult<()> {
        let mut fields = vec![
            ("theta_index", self.theta_index),
            ("phi_index", self.phi_index),
            ("power_index", self.power_index),
        ];
        if self.defocus_bool {
            fields.push(("defocus_index", self.defocus_index));
        }
        for (name, idx) in &fields {
            if *idx >= self.num_sim_params {
                return Err(BeamError::ConfigError(format!(
                    "{name}={idx} out of range for num_sim_params={}",
                    self.num_sim_params
                )));
            }
        }
        for (i, (name_a, a)) in fields.iter().enumerate() {
            if let Some((name_b, _)) = fields[i + 1..].iter().find(|(_, b)| b == a) {
                return Err(BeamError::ConfigError(format!(
                    "{name_a} and {name_b} share parameter index {a}"
                )));
            }
        }
        if !self.surface_cover_radians.is_finite() || self.surface_cover_radians < 0.0 {
            return Err(BeamError::ConfigError(format!(
                "surface_cover_radians must be finite and >= 0, got {}",
                self.surface_cover_radians
            )));
        }
        if !(0.0..=1.0).contains(&self.min_power) {
            return Err(BeamError::ConfigError(format!(
                "min_power must lie in [0, 1], got {}",
                self.min_power
            )));
        }
        if !self.defocus_range.is_finite() || !self.defocus_default.is_finite() {
            return Err(BeamError::ConfigError(
                "defocus_range and defocus_default must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Deck generation switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
    #[serde(default = "default_true")]
    pub run_gen_deck: bool,
    pub root_dir: String,
    /// Run directory prefix; example `i` is written to `<root_dir>/<sim_dir><i>`.
    #[serde(default = "default_sim_dir")]
    pub sim_dir: String,
    /// Base deck whose namelist header precedes the beam records.
    #[serde(default = "default_template_path")]
    pub template_path: String,
    /// Pulse start [ns]. When set, beams read `pulse_<id>.txt` profiles instead of `P0_TW`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t0: Option<f64>,
}

fn default_sim_dir() -> String {
    "run_".to_string()
}
fn default_template_path() -> String {
    "ifriit_inputs_base.txt".to_string()
}

impl DeckConfig {
    pub fn new(root_dir: &str) -> Self {
        DeckConfig {
            run_gen_deck: true,
            root_dir: root_dir.to_string(),
            sim_dir: default_sim_dir(),
            template_path: default_template_path(),
            t0: None,
        }
    }

    /// Run directory of one example.
    pub fn run_location(&self, example: usize) -> std::path::PathBuf {
        std::path::Path::new(&self.root_dir).join(format!("{}{}", self.sim_dir, example))
    }
}

/// Everything a batch run needs, as stored in one JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub facility: FacilityConfig,
    #[serde(default)]
    pub pointing: PointingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck: Option<DeckConfig>,
}

impl RunConfig {
    pub fn from_file(path: &str) -> BeamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.facility.validate()?;
        config.pointing.validate()?;
        Ok(config)
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Batch Run-File Generation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Parallel pointing and deck generation over a matrix of examples.
//!
//! Column `i` of the parameter matrix is example `i`. Examples share only
//! the immutable [`FacilitySpec`]; each writes its own run directory.

use crate::deck::{write_deck, DeckLayout};
use crate::pointing::{check_layout, compute_example, ExamplePointing};
use beam_types::config::{DeckConfig, PointingConfig, RunType};
use beam_types::error::{BeamError, BeamResult};
use beam_types::state::{FacilitySpec, PointingResult};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Deck settings resolved once per batch.
#[derive(Debug, Clone)]
pub struct DeckJob {
    pub layout: DeckLayout,
    pub template: String,
    pub config: DeckConfig,
}

impl DeckJob {
    /// Resolve the layout and read the header template.
    ///
    /// Returns `None` when deck generation is switched off. A relative
    /// `template_path` is taken from `root_dir`.
    pub fn prepare(
        spec: &FacilitySpec,
        config: &DeckConfig,
        run_type: RunType,
    ) -> BeamResult<Option<Self>> {
        if !config.run_gen_deck {
            return Ok(None);
        }
        let layout = DeckLayout::resolve(&spec.name, run_type)?;
        let path = Path::new(&config.root_dir).join(&config.template_path);
        let template = std::fs::read_to_string(&path).map_err(|e| {
            BeamError::ConfigError(format!(
                "Cannot read deck template {}: {e}",
                path.display()
            ))
        })?;
        Ok(Some(DeckJob {
            layout,
            template,
            config: config.clone(),
        }))
    }

    /// Write the deck of one example into its run directory.
    pub fn write(
        &self,
        example: usize,
        spec: &FacilitySpec,
        result: &PointingResult,
    ) -> BeamResult<PathBuf> {
        let run_dir = self.config.run_location(example);
        write_deck(&run_dir, &self.template, self.layout, spec, result, self.config.t0)
    }
}

/// An example that produced no pointing or no deck.
#[derive(Debug)]
pub struct ExampleFailure {
    pub example: usize,
    pub error: BeamError,
}

/// Batch outputs, one column (or entry) per example.
#[derive(Debug)]
pub struct BatchOutput {
    /// `cone_count * num_sim_params` x examples.
    pub sim_params: Array2<f64>,
    /// `num_ifriit_beams` x examples [rad].
    pub theta_pointings: Array2<f64>,
    pub phi_pointings: Array2<f64>,
    pub results: Vec<Option<PointingResult>>,
    /// Deck path per example, `None` when skipped or failed.
    pub decks: Vec<Option<PathBuf>>,
    pub failures: Vec<ExampleFailure>,
}

impl BatchOutput {
    pub fn num_examples(&self) -> usize {
        self.results.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

struct ExampleOutcome {
    pointing: Option<ExamplePointing>,
    deck: Option<PathBuf>,
    error: Option<BeamError>,
}

fn run_example(
    spec: &FacilitySpec,
    config: &PointingConfig,
    example: usize,
    params: &[f64],
    deck: Option<&DeckJob>,
) -> ExampleOutcome {
    let pointing = match compute_example(spec, config, example, params) {
        Ok(p) => p,
        Err(error) => {
            return ExampleOutcome {
                pointing: None,
                deck: None,
                error: Some(error),
            }
        }
    };
    match deck.map(|job| job.write(example, spec, &pointing.result)) {
        Some(Err(error)) => ExampleOutcome {
            pointing: Some(pointing),
            deck: None,
            error: Some(error),
        },
        Some(Ok(path)) => ExampleOutcome {
            pointing: Some(pointing),
            deck: Some(path),
            error: None,
        },
        None => ExampleOutcome {
            pointing: Some(pointing),
            deck: None,
            error: None,
        },
    }
}

/// Compute every example of `params` and optionally write its deck.
///
/// Matrix-shape errors are fatal. Per-example failures are collected in
/// [`BatchOutput::failures`]; their columns are left as NaN.
pub fn create_run_files(
    spec: &FacilitySpec,
    config: &PointingConfig,
    params: ArrayView2<f64>,
    deck: Option<&DeckJob>,
) -> BeamResult<BatchOutput> {
    config.validate()?;
    let (num_params, num_examples) = params.dim();
    check_layout(num_params, config)?;

    let columns: Vec<Vec<f64>> = (0..num_examples)
        .map(|iex| params.column(iex).to_vec())
        .collect();

    info!(
        facility = %spec.name,
        examples = num_examples,
        decks = deck.is_some(),
        "generating run files"
    );

    let outcomes: Vec<ExampleOutcome> = columns
        .into_par_iter()
        .enumerate()
        .map(|(iex, column)| run_example(spec, config, iex, &column, deck))
        .collect();

    let n_sim = spec.cone_count * config.num_sim_params;
    let n_beams = spec.table.len();
    let mut sim_params = Array2::from_elem((n_sim, num_examples), f64::NAN);
    let mut theta_pointings = Array2::from_elem((n_beams, num_examples), f64::NAN);
    let mut phi_pointings = Array2::from_elem((n_beams, num_examples), f64::NAN);
    let mut results = Vec::with_capacity(num_examples);
    let mut decks = Vec::with_capacity(num_examples);
    let mut failures = Vec::new();

    for (iex, outcome) in outcomes.into_iter().enumerate() {
        if let Some(error) = outcome.error {
            warn!(example = iex, error = %error, "example failed");
            failures.push(ExampleFailure { example: iex, error });
        }
        match outcome.pointing {
            Some(p) => {
                for (k, &v) in p.sim_params.iter().enumerate() {
                    sim_params[[k, iex]] = v;
                }
                for j in 0..n_beams {
                    theta_pointings[[j, iex]] = p.result.theta_pointing[j];
                    phi_pointings[[j, iex]] = p.result.phi_pointing[j];
                }
                results.push(Some(p.result));
            }
            None => results.push(None),
        }
        decks.push(outcome.deck);
    }

    info!(
        examples = num_examples,
        failed = failures.len(),
        "run files generated"
    );

    Ok(BatchOutput {
        sim_params,
        theta_pointings,
        phi_pointings,
        results,
        decks,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_facility_from_text;
    use beam_types::config::FacilityConfig;
    use beam_types::constants::DECK_FILE_NAME;
    use ndarray::Array2;

    const HEADER: &str = "Beam\tQuad\tCone\tTheta\tPhi\tPR";

    fn mini_spec() -> FacilitySpec {
        let cfg = FacilityConfig {
            facility: "NIF".to_string(),
            nbeams: 4,
            target_radius: 1100.0,
            num_quads: 2,
            num_cones: 2,
            default_power: 1.0,
            quad_from_each_cone: vec!["Q1T".to_string(), "Q1B".to_string()],
            beams_per_ifriit_beam: 1,
            upper_table: "upper.txt".to_string(),
            lower_table: "lower.txt".to_string(),
        };
        let upper = format!("{HEADER}\nB1\tQ1T\t44.5\t45.0\t30.0\t1\nB2\tQ1T\t44.5\t45.0\t30.0\t1\n");
        let lower = format!("{HEADER}\nB3\tQ1B\t44.5\t135.0\t30.0\t1\nB4\tQ1B\t44.5\t135.0\t30.0\t1\n");
        load_facility_from_text(&cfg, &upper, &lower).unwrap()
    }

    #[test]
    fn test_batch_shapes_without_decks() {
        let spec = mini_spec();
        let cfg = PointingConfig::default();
        let params = Array2::from_elem((8, 3), 0.5);
        let out = create_run_files(&spec, &cfg, params.view(), None).unwrap();
        assert_eq!(out.num_examples(), 3);
        assert!(out.is_complete());
        assert_eq!(out.sim_params.dim(), (8, 3));
        assert_eq!(out.theta_pointings.dim(), (4, 3));
        assert!(out.decks.iter().all(|d| d.is_none()));
        for iex in 0..3 {
            assert!((out.theta_pointings[[0, iex]] - 45f64.to_radians()).abs() < 1e-12);
            assert!((out.theta_pointings[[2, iex]] - 135f64.to_radians()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_failed_example_isolated() {
        let spec = mini_spec();
        let cfg = PointingConfig::default();
        let mut params = Array2::from_elem((4, 3), 0.5);
        params[[1, 1]] = 2.0;
        let out = create_run_files(&spec, &cfg, params.view(), None).unwrap();
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].example, 1);
        assert_eq!(out.failures[0].error.example(), Some(1));
        assert!(out.results[1].is_none());
        assert!(out.sim_params[[0, 1]].is_nan());
        assert!(out.results[0].is_some() && out.results[2].is_some());
        assert!(out.theta_pointings[[3, 2]].is_finite());
    }

    #[test]
    fn test_bad_matrix_shape_is_fatal() {
        let spec = mini_spec();
        let cfg = PointingConfig::default();
        let params = Array2::from_elem((6, 2), 0.5);
        assert!(create_run_files(&spec, &cfg, params.view(), None).is_err());
    }

    #[test]
    fn test_decks_written_per_example() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        std::fs::write(
            dir.path().join("ifriit_inputs_base.txt"),
            "&MAIN\n    NBEAMS = 0,\n/\n",
        )
        .unwrap();
        let spec = mini_spec();
        let cfg = PointingConfig::default();
        let deck_cfg = DeckConfig::new(root);
        let job = DeckJob::prepare(&spec, &deck_cfg, RunType::Nif).unwrap().unwrap();
        let params = Array2::from_elem((8, 2), 0.5);
        let out = create_run_files(&spec, &cfg, params.view(), Some(&job)).unwrap();
        for iex in 0..2 {
            let expected = dir.path().join(format!("run_{iex}")).join(DECK_FILE_NAME);
            assert_eq!(out.decks[iex].as_deref(), Some(expected.as_path()));
            let text = std::fs::read_to_string(&expected).unwrap();
            assert!(text.contains("NBEAMS                      = 4,"));
            assert_eq!(text.matches("&BEAM").count(), 4);
        }
    }

    #[test]
    fn test_prepare_skips_and_rejects() {
        let spec = mini_spec();
        let mut deck_cfg = DeckConfig::new("/nonexistent-root");
        deck_cfg.run_gen_deck = false;
        assert!(DeckJob::prepare(&spec, &deck_cfg, RunType::Nif).unwrap().is_none());
        deck_cfg.run_gen_deck = true;
        assert!(DeckJob::prepare(&spec, &deck_cfg, RunType::Nif).is_err());
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Beam Pointing Python
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! PyO3 bindings for the beam-pointing engine.
//!
//! Loads a facility once, maps a numpy parameter matrix
//! (`num_params x num_examples`) to pointings and decks, and returns the
//! physical matrices as numpy arrays.

use ndarray::{Array1, Array2};
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::{PyIOError, PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::path::Path;

use beam_core::batch::{create_run_files, BatchOutput, DeckJob};
use beam_core::dataset::{create_ytrain as encode_targets, TargetNorms};
use beam_core::intensity::{imap_norm as normalize_map, readout_intensity as readout};
use beam_core::loader::load_facility;
use beam_types::config::{DeckConfig, FacilityConfig, PointingConfig};
use beam_types::error::BeamError;
use beam_types::state::{FacilitySpec, PointingResult};

fn to_py_err(err: BeamError) -> PyErr {
    match err {
        BeamError::Io(_) => PyIOError::new_err(err.to_string()),
        BeamError::ConfigError(_)
        | BeamError::TableError { .. }
        | BeamError::UnsupportedFacility(_)
        | BeamError::Json(_) => PyValueError::new_err(err.to_string()),
        BeamError::GeometryError { .. } => PyRuntimeError::new_err(err.to_string()),
    }
}

// ─── Facility ───

/// A loaded facility: constants, beam table and cone grouping.
#[pyclass]
struct PyFacility {
    inner: FacilitySpec,
}

#[pymethods]
impl PyFacility {
    /// Load a built-in facility ("NIF" or "LMJ") from the tables in `table_dir`.
    #[new]
    fn new(facility: &str, table_dir: &str) -> PyResult<Self> {
        let config = FacilityConfig::builtin(facility).map_err(to_py_err)?;
        let inner = load_facility(&config, Path::new(table_dir)).map_err(to_py_err)?;
        Ok(PyFacility { inner })
    }

    /// Load a facility described by a JSON `FacilityConfig`.
    #[staticmethod]
    fn from_config(config_path: &str, table_dir: &str) -> PyResult<Self> {
        let config = FacilityConfig::from_file(config_path).map_err(to_py_err)?;
        let inner = load_facility(&config, Path::new(table_dir)).map_err(to_py_err)?;
        Ok(PyFacility { inner })
    }

    #[getter]
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    #[getter]
    fn num_ifriit_beams(&self) -> usize {
        self.inner.num_ifriit_beams()
    }

    #[getter]
    fn beams_per_cone(&self) -> Vec<usize> {
        self.inner.grouping.beams_per_cone()
    }

    /// Beam ids in simulated-beam order.
    fn beam_ids(&self) -> Vec<String> {
        self.inner
            .table
            .records()
            .iter()
            .map(|r| r.beam_id.clone())
            .collect()
    }

    /// Quad port centres (theta, phi) per beam [rad].
    fn port_centres<'py>(
        &self,
        py: Python<'py>,
    ) -> (Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>) {
        let g = &self.inner.grouping;
        (
            Array1::from_vec(g.port_centre_theta.clone()).into_pyarray(py),
            Array1::from_vec(g.port_centre_phi.clone()).into_pyarray(py),
        )
    }

    /// Map `params` to pointings; with `deck_root`, also write one deck per example.
    #[pyo3(signature = (params, config_path=None, deck_root=None))]
    fn create_run_files(
        &self,
        py: Python<'_>,
        params: PyReadonlyArray2<'_, f64>,
        config_path: Option<&str>,
        deck_root: Option<&str>,
    ) -> PyResult<PyBatchResult> {
        let pointing = match config_path {
            Some(path) => PointingConfig::from_file(path).map_err(to_py_err)?,
            None => PointingConfig::default(),
        };
        let job = match deck_root {
            Some(root) => DeckJob::prepare(&self.inner, &DeckConfig::new(root), pointing.run_type)
                .map_err(to_py_err)?,
            None => None,
        };
        let params: Array2<f64> = params.as_array().to_owned();
        let spec = &self.inner;
        let output = py
            .allow_threads(|| create_run_files(spec, &pointing, params.view(), job.as_ref()))
            .map_err(to_py_err)?;
        Ok(PyBatchResult::from(output))
    }

    fn __repr__(&self) -> String {
        format!(
            "Facility(name={}, beams={}, cones={})",
            self.inner.name, self.inner.beam_count, self.inner.cone_count
        )
    }
}

// ─── Batch result ───

/// Outputs of one batch; matrices are `rows x num_examples`.
#[pyclass]
struct PyBatchResult {
    sim_params: Array2<f64>,
    theta_pointings: Array2<f64>,
    phi_pointings: Array2<f64>,
    results: Vec<Option<PointingResult>>,
    #[pyo3(get)]
    decks: Vec<Option<String>>,
    /// (example, message) for every failed example.
    #[pyo3(get)]
    failures: Vec<(usize, String)>,
}

impl From<BatchOutput> for PyBatchResult {
    fn from(out: BatchOutput) -> Self {
        PyBatchResult {
            sim_params: out.sim_params,
            theta_pointings: out.theta_pointings,
            phi_pointings: out.phi_pointings,
            results: out.results,
            decks: out
                .decks
                .into_iter()
                .map(|d| d.map(|p| p.display().to_string()))
                .collect(),
            failures: out
                .failures
                .into_iter()
                .map(|f| (f.example, f.error.to_string()))
                .collect(),
        }
    }
}

impl PyBatchResult {
    fn example(&self, example: usize) -> PyResult<&PointingResult> {
        self.results
            .get(example)
            .and_then(|r| r.as_ref())
            .ok_or_else(|| PyIndexError::new_err(format!("no pointing for example {example}")))
    }
}

#[pymethods]
impl PyBatchResult {
    #[getter]
    fn sim_params<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.sim_params.clone().into_pyarray(py)
    }

    #[getter]
    fn theta_pointings<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.theta_pointings.clone().into_pyarray(py)
    }

    #[getter]
    fn phi_pointings<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.phi_pointings.clone().into_pyarray(py)
    }

    /// Pointing positions `[n_beams, 3]` of one example [um].
    fn pointings<'py>(&self, py: Python<'py>, example: usize) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let res = self.example(example)?;
        let flat: Vec<f64> = res.coord_n.iter().flatten().copied().collect();
        let arr = Array2::from_shape_vec((res.len(), 3), flat)
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok(arr.into_pyarray(py))
    }

    /// Per-beam power of one example [TW].
    fn p0<'py>(&self, py: Python<'py>, example: usize) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(Array1::from_vec(self.example(example)?.p0.clone()).into_pyarray(py))
    }

    /// Per-beam defocus of one example [mm].
    fn defocus<'py>(&self, py: Python<'py>, example: usize) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(Array1::from_vec(self.example(example)?.defocus.clone()).into_pyarray(py))
    }

    fn __repr__(&self) -> String {
        format!(
            "BatchResult(examples={}, failed={})",
            self.results.len(),
            self.failures.len()
        )
    }
}

// ─── Dataset and intensity ───

/// Normalize grid indices into one training target vector.
#[pyfunction]
#[allow(clippy::too_many_arguments)]
fn create_ytrain<'py>(
    py: Python<'py>,
    pointing_per_cone: PyReadonlyArray1<'py, f64>,
    pointing_nside: usize,
    defocus_per_cone: PyReadonlyArray1<'py, f64>,
    num_defocus: usize,
    power_per_cone: PyReadonlyArray1<'py, f64>,
    num_powers: usize,
) -> PyResult<(Bound<'py, PyArray1<f64>>, (usize, usize, usize))> {
    let norms = TargetNorms {
        pointing_nside,
        num_defocus,
        num_powers,
    };
    let (y, norms) = encode_targets(
        pointing_per_cone.as_array(),
        norms,
        defocus_per_cone.as_array(),
        power_per_cone.as_array(),
    )
    .map_err(to_py_err)?;
    Ok((
        y.into_pyarray(py),
        (norms.pointing_nside, norms.num_defocus, norms.num_powers),
    ))
}

/// `map / mean - 1` and the mean.
#[pyfunction]
fn imap_norm<'py>(
    py: Python<'py>,
    intensity_map: PyReadonlyArray1<'py, f64>,
) -> PyResult<(Bound<'py, PyArray1<f64>>, f64)> {
    let (norm, avg) = normalize_map(intensity_map.as_array()).map_err(to_py_err)?;
    Ok((norm.into_pyarray(py), avg))
}

/// Deposited power summary: (total TW, TW per beam, efficiency %, RMS %, spatial %).
#[pyfunction]
fn readout_intensity<'py>(
    py: Python<'py>,
    intensity_map: PyReadonlyArray1<'py, f64>,
    target_radius_um: f64,
    beam_count: usize,
) -> PyResult<(f64, f64, f64, f64, Bound<'py, PyArray1<f64>>)> {
    let r = readout(intensity_map.as_array(), target_radius_um, beam_count).map_err(to_py_err)?;
    Ok((
        r.total_power,
        r.power_per_beam,
        r.drive_efficiency,
        r.rms,
        r.rms_spatial.into_pyarray(py),
    ))
}

// ─── Module registration ───

/// Rust-accelerated ICF beam pointing and IFRIIT deck generation.
#[pymodule]
fn beam_pointing(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFacility>()?;
    m.add_class::<PyBatchResult>()?;
    m.add_function(wrap_pyfunction!(create_ytrain, m)?)?;
    m.add_function(wrap_pyfunction!(imap_norm, m)?)?;
    m.add_function(wrap_pyfunction!(readout_intensity, m)?)?;
    Ok(())
}

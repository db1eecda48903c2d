// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Facility-to-Deck Integration Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
mod common;

use beam_core::batch::{create_run_files, DeckJob};
use beam_core::deck::generate_deck;
use beam_core::loader::{load_facility, load_facility_from_text};
use beam_core::pointing::compute_example;
use beam_types::config::{DeckConfig, FacilityConfig, PointingConfig, RunType};
use beam_types::constants::{DECK_FILE_NAME, DECK_TRAILER};
use beam_types::error::BeamError;
use ndarray::Array2;

fn write_template(dir: &std::path::Path) {
    std::fs::write(dir.join("ifriit_inputs_base.txt"), common::TEMPLATE).unwrap();
}

#[test]
fn test_mini_facility_to_deck() {
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path());
    let cfg = common::mini_config();
    let (upper, lower) = common::mini_tables();
    std::fs::write(dir.path().join(&cfg.upper_table), upper).unwrap();
    std::fs::write(dir.path().join(&cfg.lower_table), lower).unwrap();

    let spec = load_facility(&cfg, dir.path()).unwrap();
    let pointing = PointingConfig::default();
    let deck_cfg = DeckConfig::new(dir.path().to_str().unwrap());
    let job = DeckJob::prepare(&spec, &deck_cfg, RunType::Nif).unwrap();
    let params = Array2::from_elem((8, 1), 0.5);
    let out = create_run_files(&spec, &pointing, params.view(), job.as_ref()).unwrap();
    assert!(out.is_complete());

    // All-0.5 parameters point every beam at its quad's port centre.
    let result = out.results[0].as_ref().unwrap();
    for row in 0..4 {
        let theta = spec.grouping.port_centre_theta[row];
        let phi = spec.grouping.port_centre_phi[row];
        let expected = [
            1100.0 * theta.sin() * phi.cos(),
            1100.0 * theta.sin() * phi.sin(),
            1100.0 * theta.cos(),
        ];
        for k in 0..3 {
            assert!((result.coord_n[row][k] - expected[k]).abs() < 1e-9);
        }
    }
    assert!((spec.grouping.port_centre_theta[0] - 45f64.to_radians()).abs() < 1e-12);
    assert!((spec.grouping.port_centre_phi[2] - 215f64.to_radians()).abs() < 1e-12);

    let text = std::fs::read_to_string(dir.path().join("run_0").join(DECK_FILE_NAME)).unwrap();
    assert_eq!(text.matches("&BEAM").count(), 4);
    assert!(text.starts_with("&MAIN\n    NBEAMS                      = 4,\n"));
    assert!(text.contains("DIAGNOSE_INPUT_BEAMS_RADIUS_UM = 1100.0d0,\n"));
    let last = text.lines().last().unwrap();
    assert_eq!(last, DECK_TRAILER);
    assert!(!text.ends_with('\n'));
}

#[test]
fn test_builtin_beams_per_cone_reconcile() {
    for cfg in [FacilityConfig::nif(), FacilityConfig::lmj()] {
        let (upper, lower) = common::synthetic_tables(&cfg);
        let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
        let per_cone = spec.grouping.beams_per_cone();
        assert_eq!(per_cone.len(), cfg.num_cones);
        assert_eq!(per_cone.iter().sum::<usize>(), cfg.nbeams);
        let fused: usize = per_cone.iter().map(|b| b / cfg.beams_per_ifriit_beam).sum();
        assert_eq!(fused, cfg.nbeams / cfg.beams_per_ifriit_beam);
        assert_eq!(spec.table.len(), cfg.num_ifriit_beams());
    }
}

#[test]
fn test_nif_cone_sizes() {
    let cfg = FacilityConfig::nif();
    let (upper, lower) = common::synthetic_tables(&cfg);
    let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
    assert_eq!(
        spec.grouping.beams_per_cone(),
        vec![16, 16, 32, 32, 16, 16, 32, 32]
    );
    assert!(!spec.default_fuse());
}

#[test]
fn test_lmj_fused_drive() {
    let cfg = FacilityConfig::lmj();
    let (upper, lower) = common::synthetic_tables(&cfg);
    let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
    assert_eq!(spec.grouping.beams_per_cone(), vec![16, 24, 24, 16]);
    assert!(spec.default_fuse());

    let pointing = PointingConfig::default();
    let params = vec![0.5, 0.5, 0.5, 1.0, 0.5, 0.5, 0.5, 0.0];
    let out = compute_example(&spec, &pointing, 0, &params).unwrap();
    // Four physical beams per simulated beam.
    assert!(out.result.p0.iter().all(|&p| p == 4.0 || p == 2.0));
    assert!(out.result.fuse.iter().all(|&f| f));
}

#[test]
fn test_load_twice_is_equal() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = FacilityConfig::nif();
    common::write_tables(&cfg, dir.path());
    let a = load_facility(&cfg, dir.path()).unwrap();
    let b = load_facility(&cfg, dir.path()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_quads_of_a_cone_share_offset_not_pointing() {
    let cfg = FacilityConfig::nif();
    let (upper, lower) = common::synthetic_tables(&cfg);
    let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
    let pointing = PointingConfig::default();
    let params: Vec<f64> = (0..32).map(|i| (i % 7) as f64 / 6.0).collect();
    let out = compute_example(&spec, &pointing, 0, &params).unwrap();

    for cone in &spec.grouping.cones {
        for quad in &cone.quads {
            let first = out.result.coord_n[quad.rows[0]];
            for &row in &quad.rows {
                assert_eq!(out.result.coord_n[row], first);
            }
        }
        // Distinct ports give distinct pointings.
        let a = out.result.coord_n[cone.quads[0].rows[0]];
        let b = out.result.coord_n[cone.quads[1].rows[0]];
        assert_ne!(a, b);
    }
}

#[test]
fn test_same_named_cone_outside_tolerance_not_grouped() {
    let cfg = FacilityConfig::nif();
    let (upper, lower) = common::synthetic_tables(&cfg);
    let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
    let top = &spec.grouping.cones[0];
    let bottom = &spec.grouping.cones[4];
    assert_eq!(top.cone_id, bottom.cone_id);
    for quad in &top.quads {
        assert!(bottom.quads.iter().all(|q| q.quad_id != quad.quad_id));
        assert!((quad.port_theta - 23.5f64.to_radians()).abs() < 1e-12);
    }
}

#[test]
fn test_defocus_switch_end_to_end() {
    let cfg = common::mini_config();
    let (upper, lower) = common::mini_tables();
    let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
    let mut pointing = PointingConfig {
        defocus_range: 8.0,
        defocus_default: 1.25,
        ..PointingConfig::default()
    };

    let mut params = Array2::from_elem((8, 3), 0.5);
    for (iex, v) in [0.0, 0.5, 1.0].iter().enumerate() {
        params[[pointing.defocus_index, iex]] = *v;
        params[[pointing.num_sim_params + pointing.defocus_index, iex]] = *v;
    }

    let linear = create_run_files(&spec, &pointing, params.view(), None).unwrap();
    for (iex, expected) in [0.0, 4.0, 8.0].iter().enumerate() {
        let res = linear.results[iex].as_ref().unwrap();
        assert!(res.defocus.iter().all(|d| (d - expected).abs() < 1e-12));
        assert!((linear.sim_params[[pointing.defocus_index, iex]] - expected).abs() < 1e-12);
    }

    pointing.defocus_bool = false;
    let fixed = create_run_files(&spec, &pointing, params.view(), None).unwrap();
    for iex in 0..3 {
        let res = fixed.results[iex].as_ref().unwrap();
        assert!(res.defocus.iter().all(|&d| d == 1.25));
        assert_eq!(fixed.sim_params[[pointing.defocus_index, iex]], 0.0);
    }
}

#[test]
fn test_unsupported_facility_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = common::mini_config();
    let (upper, lower) = common::mini_tables();
    let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
    let result = compute_example(&spec, &PointingConfig::default(), 0, &[0.5; 4])
        .unwrap()
        .result;

    let run_dir = dir.path().join("run_0");
    let err = generate_deck("OMEGA", RunType::Nif, &run_dir, common::TEMPLATE, &spec, &result, None)
        .unwrap_err();
    assert!(matches!(err, BeamError::UnsupportedFacility(ref name) if name == "OMEGA"));
    assert!(!run_dir.exists());

    cfg.facility = "OMEGA".to_string();
    let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
    let deck_cfg = DeckConfig::new(dir.path().to_str().unwrap());
    assert!(matches!(
        DeckJob::prepare(&spec, &deck_cfg, RunType::Nif),
        Err(BeamError::UnsupportedFacility(_))
    ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_test_run_type_deck_fields() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = common::mini_config();
    let (upper, lower) = common::mini_tables();
    let spec = load_facility_from_text(&cfg, &upper, &lower).unwrap();
    let result = compute_example(&spec, &PointingConfig::default(), 0, &[0.5; 8])
        .unwrap()
        .result;
    let path = generate_deck("NIF", RunType::Test, dir.path(), common::TEMPLATE, &spec, &result, None)
        .unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert_eq!(text.matches("THETA_DEG            = 45.0000000000d0,").count(), 2);
    assert_eq!(text.matches("PHI_DEG              = 215.0000000000d0,").count(), 2);
    assert_eq!(text.matches("FOCAL_M             = 10.0d0,").count(), 4);
    assert!(!text.contains("PREDEF_FACILITY"));
}

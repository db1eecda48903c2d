// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Synthetic Facility Tables
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Beam tables with the cone/quad layout of the built-in facilities and
//! evenly spaced synthetic port angles.
#![allow(dead_code)]

use beam_types::config::FacilityConfig;
use std::fmt::Write;
use std::path::Path;

pub const HEADER: &str = "Beam\tQuad\tCone\tTheta\tPhi\tPR";

/// One slot of `quad_from_each_cone`.
pub struct ConeSlot {
    pub rep: String,
    pub cone: f64,
    pub upper: bool,
    pub quads: usize,
    pub rows_per_quad: usize,
}

fn layout(cfg: &FacilityConfig) -> (Vec<f64>, Vec<usize>, usize) {
    match cfg.facility.as_str() {
        "NIF" => (vec![23.5, 30.0, 44.5, 50.0], vec![4, 4, 8, 8], 4),
        "LMJ" => (vec![33.2, 49.0], vec![4, 6], 1),
        other => panic!("no synthetic layout for {other}"),
    }
}

pub fn slots(cfg: &FacilityConfig) -> Vec<ConeSlot> {
    let (cones, quads, rows_per_quad) = layout(cfg);
    let half = cfg.num_cones / 2;
    cfg.quad_from_each_cone
        .iter()
        .enumerate()
        .map(|(i, rep)| {
            let upper = i < half;
            // LMJ lists its lower cones equator-first.
            let k = if upper || cfg.facility == "NIF" {
                i % half
            } else {
                half - 1 - (i - half)
            };
            ConeSlot {
                rep: rep.clone(),
                cone: cones[k],
                upper,
                quads: quads[k],
                rows_per_quad,
            }
        })
        .collect()
}

fn push_slot(out: &mut String, slot_idx: usize, slot: &ConeSlot) {
    let port_theta = if slot.upper { slot.cone } else { 180.0 - slot.cone };
    let tag = if slot.upper { 'T' } else { 'B' };
    for q in 0..slot.quads {
        let quad = if q == 0 {
            slot.rep.clone()
        } else {
            format!("S{slot_idx}Q{q}{tag}")
        };
        let port_phi = 7.5 * slot_idx as f64 + 360.0 * q as f64 / slot.quads as f64;
        for b in 0..slot.rows_per_quad {
            let sign = if b % 2 == 0 { -1.0 } else { 1.0 };
            let theta = port_theta + sign * 0.5 * (b / 2) as f64;
            let phi = port_phi + sign * 0.5;
            let _ = writeln!(
                out,
                "{quad}B{b}\t{quad}\t{}\t{theta}\t{phi}\t{}",
                slot.cone,
                q % 3 + 1
            );
        }
    }
}

/// Upper and lower table text for a built-in facility config.
pub fn synthetic_tables(cfg: &FacilityConfig) -> (String, String) {
    let mut upper = format!("{HEADER}\n");
    let mut lower = format!("{HEADER}\n");
    for (i, slot) in slots(cfg).iter().enumerate() {
        if slot.upper {
            push_slot(&mut upper, i, slot);
        } else {
            push_slot(&mut lower, i, slot);
        }
    }
    (upper, lower)
}

pub fn write_tables(cfg: &FacilityConfig, dir: &Path) {
    let (upper, lower) = synthetic_tables(cfg);
    std::fs::write(dir.join(&cfg.upper_table), upper).unwrap();
    std::fs::write(dir.join(&cfg.lower_table), lower).unwrap();
}

/// Two cones, one two-beam quad per hemisphere.
pub fn mini_config() -> FacilityConfig {
    FacilityConfig {
        facility: "NIF".to_string(),
        nbeams: 4,
        target_radius: 1100.0,
        num_quads: 2,
        num_cones: 2,
        default_power: 1.0,
        quad_from_each_cone: vec!["Q1T".to_string(), "Q1B".to_string()],
        beams_per_ifriit_beam: 1,
        upper_table: "mini_upper.txt".to_string(),
        lower_table: "mini_lower.txt".to_string(),
    }
}

pub fn mini_tables() -> (String, String) {
    (
        format!("{HEADER}\nB1\tQ1T\t44.5\t44.0\t30.0\t1\nB2\tQ1T\t44.5\t46.0\t40.0\t1\n"),
        format!("{HEADER}\nB3\tQ1B\t44.5\t134.0\t210.0\t1\nB4\tQ1B\t44.5\t136.0\t220.0\t1\n"),
    )
}

pub const TEMPLATE: &str = "&MAIN\n    NBEAMS = 0,\n    DIAGNOSE_INPUT_BEAMS_RADIUS_UM = 0.0d0,\n/\n";

// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Facility Beam-Table Loader
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Facility loading: two tab-separated hemisphere tables into one
//! [`FacilitySpec`] with a precomputed [`ConeGrouping`].
//!
//! Column typing is positional: columns 0-1 are strings, 2-4 floats,
//! 5 and beyond integers. The named columns `Beam`, `Quad`, `Cone`,
//! `Theta`, `Phi` and `PR` must sit in matching positions.

use beam_types::config::FacilityConfig;
use beam_types::constants::CONE_GROUPING_TOLERANCE_DEG;
use beam_types::error::{BeamError, BeamResult};
use beam_types::state::{BeamRecord, BeamTable, ConeGroup, ConeGrouping, FacilitySpec, QuadGroup};
use std::path::Path;
use tracing::{debug, info};

/// Column positions resolved from a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMap {
    width: usize,
    beam: usize,
    quad: usize,
    cone: usize,
    theta: usize,
    phi: usize,
    port_radius: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Float,
    Integer,
}

fn column_kind(idx: usize) -> ColumnKind {
    match idx {
        0 | 1 => ColumnKind::Text,
        2..=4 => ColumnKind::Float,
        _ => ColumnKind::Integer,
    }
}

impl ColumnMap {
    fn from_header(fields: &[&str], file: &str, line: usize) -> BeamResult<Self> {
        let find = |name: &str, kind: ColumnKind| -> BeamResult<usize> {
            let idx = fields.iter().position(|f| *f == name).ok_or_else(|| {
                table_error(file, line, format!("header is missing column '{name}'"))
            })?;
            if column_kind(idx) != kind {
                return Err(table_error(
                    file,
                    line,
                    format!("column '{name}' at position {idx} must be {kind:?}"),
                ));
            }
            Ok(idx)
        };
        Ok(ColumnMap {
            width: fields.len(),
            beam: find("Beam", ColumnKind::Text)?,
            quad: find("Quad", ColumnKind::Text)?,
            cone: find("Cone", ColumnKind::Float)?,
            theta: find("Theta", ColumnKind::Float)?,
            phi: find("Phi", ColumnKind::Float)?,
            port_radius: find("PR", ColumnKind::Integer)?,
        })
    }

    /// Parse one data row; angles are converted to radians.
    fn parse_row(&self, fields: &[&str], file: &str, line: usize) -> BeamResult<BeamRecord> {
        if fields.len() != self.width {
            return Err(table_error(
                file,
                line,
                format!("expected {} columns, found {}", self.width, fields.len()),
            ));
        }
        let mut floats = [0.0_f64; 5];
        let mut port_radius = 0_i64;
        for (idx, raw) in fields.iter().enumerate() {
            match column_kind(idx) {
                ColumnKind::Text => {}
                ColumnKind::Float => {
                    floats[idx] = raw.trim().parse::<f64>().map_err(|e| {
                        table_error(file, line, format!("column {idx} '{raw}' is not a float: {e}"))
                    })?;
                }
                ColumnKind::Integer => {
                    let val = raw.trim().parse::<i64>().map_err(|e| {
                        table_error(
                            file,
                            line,
                            format!("column {idx} '{raw}' is not an integer: {e}"),
                        )
                    })?;
                    if idx == self.port_radius {
                        port_radius = val;
                    }
                }
            }
        }
        Ok(BeamRecord {
            beam_id: fields[self.beam].trim().to_string(),
            quad_id: fields[self.quad].trim().to_string(),
            cone_id: floats[self.cone],
            theta: floats[self.theta].to_radians(),
            phi: floats[self.phi].to_radians(),
            port_radius,
        })
    }
}

fn table_error(file: &str, line: usize, message: String) -> BeamError {
    BeamError::TableError {
        file: file.to_string(),
        line,
        message,
    }
}

/// Non-blank rows with their 1-based line numbers.
fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i, l.split('\t').collect()))
}

/// Join the two hemisphere tables into `num_ifriit_beams` rows.
///
/// The running row index `j` starts at -1 on the upper header and
/// increments once per row across both files. In the lower file the row
/// read at `j == num_ifriit_beams / 2` is its header; every other row is
/// stored at `j - 1`. A well-formed pair therefore has exactly half the
/// rows in each file.
pub fn join_hemisphere_tables(
    config: &FacilityConfig,
    upper: (&str, &str),
    lower: (&str, &str),
) -> BeamResult<BeamTable> {
    config.validate()?;
    let n = config.num_ifriit_beams();
    let half = (n / 2) as isize;
    let mut slots: Vec<Option<BeamRecord>> = vec![None; n];

    let (upper_name, upper_text) = upper;
    let (lower_name, lower_text) = lower;

    let mut j: isize = -1;
    let mut columns: Option<ColumnMap> = None;
    for (line, fields) in rows(upper_text) {
        if j == -1 {
            columns = Some(ColumnMap::from_header(&fields, upper_name, line)?);
        } else {
            let map = columns.as_ref().ok_or_else(|| {
                table_error(upper_name, line, "row before header".to_string())
            })?;
            let record = map.parse_row(&fields, upper_name, line)?;
            store(&mut slots, j, record, upper_name, line)?;
        }
        j += 1;
    }
    if columns.is_none() {
        return Err(table_error(upper_name, 0, "table is empty".to_string()));
    }

    for (line, fields) in rows(lower_text) {
        if j == half {
            columns = Some(ColumnMap::from_header(&fields, lower_name, line)?);
        } else {
            let map = columns.as_ref().ok_or_else(|| {
                table_error(lower_name, line, "row before header".to_string())
            })?;
            let record = map.parse_row(&fields, lower_name, line)?;
            store(&mut slots, j - 1, record, lower_name, line)?;
        }
        j += 1;
    }

    let mut records = Vec::with_capacity(n);
    for (idx, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(rec) => records.push(rec),
            None => {
                return Err(BeamError::ConfigError(format!(
                    "{} beam table has no row for simulated beam {idx} of {n} \
                     (each hemisphere file must hold {half} rows)",
                    config.facility
                )))
            }
        }
    }
    BeamTable::new(records)
}

fn store(
    slots: &mut [Option<BeamRecord>],
    idx: isize,
    record: BeamRecord,
    file: &str,
    line: usize,
) -> BeamResult<()> {
    if idx < 0 || idx as usize >= slots.len() {
        return Err(table_error(
            file,
            line,
            format!(
                "row '{}' lands at index {idx}, outside the {}-beam table",
                record.beam_id,
                slots.len()
            ),
        ));
    }
    slots[idx as usize] = Some(record);
    Ok(())
}

/// Precompute cone -> quad -> row membership and quad port centres.
///
/// For cone slot `i` the representative quad's first row fixes the cone
/// name and reference port theta. Every quad carrying that cone name whose
/// first row lies within `tolerance_rad` of the reference joins the slot.
/// Each table row must be claimed by exactly one slot.
pub fn derive_cone_grouping(
    table: &BeamTable,
    quad_from_each_cone: &[String],
    beams_per_ifriit_beam: usize,
    tolerance_rad: f64,
) -> BeamResult<ConeGrouping> {
    let records = table.records();
    let n = records.len();
    let mut cone_of_row: Vec<Option<usize>> = vec![None; n];
    let mut port_centre_theta = vec![0.0; n];
    let mut port_centre_phi = vec![0.0; n];
    let mut cones = Vec::with_capacity(quad_from_each_cone.len());

    for (icone, rep) in quad_from_each_cone.iter().enumerate() {
        let rep_rows = table.quad_rows(rep);
        let start = *rep_rows.first().ok_or_else(|| {
            BeamError::ConfigError(format!("Quad '{rep}' for cone {icone} is not in the beam table"))
        })?;
        let cone_id = records[start].cone_id;
        let theta_ref = records[start].theta;

        let mut quad_names: Vec<&str> = Vec::new();
        for rec in records.iter().filter(|r| r.cone_id == cone_id) {
            if !quad_names.contains(&rec.quad_id.as_str()) {
                quad_names.push(&rec.quad_id);
            }
        }

        let mut quads = Vec::new();
        for quad in quad_names {
            let rows = table.quad_rows(quad);
            let first = rows[0];
            if (records[first].theta - theta_ref).abs() >= tolerance_rad {
                continue;
            }
            let count = rows.len() as f64;
            let port_theta = rows.iter().map(|&r| records[r].theta).sum::<f64>() / count;
            let port_phi = rows.iter().map(|&r| records[r].phi).sum::<f64>() / count;
            for &row in &rows {
                if let Some(other) = cone_of_row[row] {
                    return Err(BeamError::ConfigError(format!(
                        "Beam '{}' is claimed by cones {other} and {icone}",
                        records[row].beam_id
                    )));
                }
                cone_of_row[row] = Some(icone);
                port_centre_theta[row] = port_theta;
                port_centre_phi[row] = port_phi;
            }
            quads.push(QuadGroup {
                quad_id: quad.to_string(),
                rows,
                port_theta,
                port_phi,
            });
        }

        let beams_per_cone =
            (table.cone_count(cone_id) as f64 / 2.0 * beams_per_ifriit_beam as f64) as usize;
        debug!(
            cone = icone,
            quad = %rep,
            cone_id,
            quads = quads.len(),
            beams_per_cone,
            "cone grouped"
        );
        cones.push(ConeGroup {
            representative_quad: rep.clone(),
            cone_id,
            quads,
            beams_per_cone,
        });
    }

    let cone_of_row = cone_of_row
        .into_iter()
        .enumerate()
        .map(|(row, c)| {
            c.ok_or_else(|| {
                BeamError::ConfigError(format!(
                    "Beam '{}' (row {row}) is not reached by any cone",
                    records[row].beam_id
                ))
            })
        })
        .collect::<BeamResult<Vec<usize>>>()?;

    Ok(ConeGrouping {
        cones,
        cone_of_row,
        port_centre_theta,
        port_centre_phi,
    })
}

/// Assemble a [`FacilitySpec`] from constants and a joined beam table.
pub fn build_facility(config: &FacilityConfig, table: BeamTable) -> BeamResult<FacilitySpec> {
    config.validate()?;
    if table.len() != config.num_ifriit_beams() {
        return Err(BeamError::ConfigError(format!(
            "Beam table has {} rows, expected {}",
            table.len(),
            config.num_ifriit_beams()
        )));
    }
    let grouping = derive_cone_grouping(
        &table,
        &config.quad_from_each_cone,
        config.beams_per_ifriit_beam,
        CONE_GROUPING_TOLERANCE_DEG.to_radians(),
    )?;
    let total: usize = grouping.beams_per_cone().iter().sum();
    if total != config.nbeams {
        return Err(BeamError::ConfigError(format!(
            "beams_per_cone sums to {total}, facility has {} beams",
            config.nbeams
        )));
    }
    Ok(FacilitySpec {
        name: config.facility.clone(),
        beam_count: config.nbeams,
        target_radius: config.target_radius,
        cone_count: config.num_cones,
        beams_per_ifriit_beam: config.beams_per_ifriit_beam,
        default_power: config.default_power,
        quad_from_each_cone: config.quad_from_each_cone.clone(),
        table,
        grouping,
    })
}

/// Load a facility from in-memory table text.
pub fn load_facility_from_text(
    config: &FacilityConfig,
    upper_text: &str,
    lower_text: &str,
) -> BeamResult<FacilitySpec> {
    config.validate()?;
    let table = join_hemisphere_tables(
        config,
        (&config.upper_table, upper_text),
        (&config.lower_table, lower_text),
    )?;
    build_facility(config, table)
}

/// Load a facility whose hemisphere tables live in `table_dir`.
pub fn load_facility(config: &FacilityConfig, table_dir: &Path) -> BeamResult<FacilitySpec> {
    let upper = std::fs::read_to_string(table_dir.join(&config.upper_table))?;
    let lower = std::fs::read_to_string(table_dir.join(&config.lower_table))?;
    let spec = load_facility_from_text(config, &upper, &lower)?;
    info!(
        facility = %spec.name,
        beams = spec.beam_count,
        rows = spec.table.len(),
        cones = spec.cone_count,
        "facility loaded"
    );
    Ok(spec)
}

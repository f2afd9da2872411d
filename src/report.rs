//! CSV output for computed probabilities.
//!
//! Reports are plain numeric tables meant to be picked up by the plotting layer: one row per
//! evaluated point, with the inputs that produced it.

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;

use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::curve::{CurveFamilyMember, CurvePoint};
use crate::error::ExtinctionError;
use crate::extinction::ExtinctionRecord;
use crate::log::debug;
use crate::offspring::OffspringModel;

/// A row of a curve report. `model` is empty for the homogeneous control curve, whose
/// hotspot fraction is 0.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveRow {
    pub model: Option<OffspringModel>,
    pub hotspot_fraction: f64,
    pub risk_tolerance_mean: Option<f64>,
    pub r0: f64,
    pub extinction_probability: f64,
    pub outbreak_probability: f64,
}

impl CurveRow {
    #[must_use]
    pub fn new(
        model: Option<OffspringModel>,
        hotspot_fraction: f64,
        risk_tolerance_mean: Option<f64>,
        point: &CurvePoint,
    ) -> Self {
        CurveRow {
            model,
            hotspot_fraction,
            risk_tolerance_mean,
            r0: point.r0,
            extinction_probability: point.extinction_probability,
            outbreak_probability: point.outbreak_probability,
        }
    }
}

/// Checks that the path is valid. Creates the file and all parent directories if
/// they do not exist. Returns the file if successful.
///
/// # Errors
///
/// Returns `ExtinctionError::ExtinctionError` if the path does not end in `.csv`, or an
/// `IoError` if the directories or the file cannot be created.
pub fn create_report_file(path: &Path) -> Result<File, ExtinctionError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            debug!("writing report to {}", path.display());
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(ExtinctionError::ExtinctionError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// Writes one row per point of every member of a curve family.
///
/// # Errors
///
/// Returns `ExtinctionError::CSVError` if a row cannot be written.
pub fn write_family_csv<W: Write>(
    writer: W,
    model: OffspringModel,
    family: &[CurveFamilyMember],
) -> Result<(), ExtinctionError> {
    let rows = family.iter().flat_map(|member| {
        member.points.iter().map(move |point| {
            CurveRow::new(
                Some(model),
                member.hotspot_fraction,
                Some(member.risk_tolerance_mean),
                point,
            )
        })
    });
    write_rows(writer, rows)
}

/// Writes the homogeneous control curve.
///
/// # Errors
///
/// Returns `ExtinctionError::CSVError` if a row cannot be written.
pub fn write_homogeneous_csv<W: Write>(
    writer: W,
    points: &[CurvePoint],
) -> Result<(), ExtinctionError> {
    write_rows(
        writer,
        points.iter().map(|point| CurveRow::new(None, 0.0, None, point)),
    )
}

/// Writes one row per record.
///
/// # Errors
///
/// Returns `ExtinctionError::CSVError` if a row cannot be written.
pub fn write_records_csv<W: Write>(
    writer: W,
    records: &[ExtinctionRecord],
) -> Result<(), ExtinctionError> {
    write_rows(writer, records.iter())
}

fn write_rows<W, I, T>(writer: W, rows: I) -> Result<(), ExtinctionError>
where
    W: Write,
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let mut writer = Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

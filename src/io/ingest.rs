//! CSV ingest and validation.
//!
//! This module turns the two user tables into engine inputs:
//!
//! - the calibration standards (`concentration`, `absorbance`)
//! - the unknown-sample rows (`label`, `absorbance`, absorbance may be blank)
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad standards, but report what happened)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{CalibrationPoint, CalibrationSet, UnknownSample, parse_reading};
use crate::error::AppError;

const CONCENTRATION_COLUMNS: &[&str] = &[
    "concentration",
    "conc",
    "concentration (mg/ml)",
    "glucose (mg/ml)",
];
const ABSORBANCE_COLUMNS: &[&str] = &["absorbance", "abs", "absorbance (au)"];
const LABEL_COLUMNS: &[&str] = &["label", "dilution", "dilution factor", "sample"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingested calibration standards plus the rows that were skipped.
#[derive(Debug, Clone)]
pub struct IngestedStandards {
    pub set: CalibrationSet,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Ingested unknown-sample rows.
#[derive(Debug, Clone)]
pub struct IngestedUnknowns {
    pub samples: Vec<UnknownSample>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load calibration standards from a CSV file.
pub fn load_standards(path: &Path) -> Result<IngestedStandards, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open standards CSV '{}': {e}", path.display()),
        )
    })?;
    read_standards(file)
}

/// Load unknown-sample rows from a CSV file.
pub fn load_unknowns(path: &Path) -> Result<IngestedUnknowns, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open unknowns CSV '{}': {e}", path.display()),
        )
    })?;
    read_unknowns(file)
}

pub fn read_standards<R: Read>(source: R) -> Result<IngestedStandards, AppError> {
    let mut reader = csv_reader(source);
    let header_map = read_header_map(&mut reader)?;

    let conc_idx = find_column(&header_map, CONCENTRATION_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `concentration`"))?;
    let abs_idx = find_column(&header_map, ABSORBANCE_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `absorbance`"))?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if record.iter().all(|f| f.trim().is_empty()) {
            rows_read -= 1;
            continue;
        }

        match parse_standard(&record, conc_idx, abs_idx) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in &row_errors {
        tracing::warn!(line = e.line, "skipped calibration row: {}", e.message);
    }

    if points.is_empty() {
        return Err(AppError::new(3, "No valid calibration rows found."));
    }

    Ok(IngestedStandards {
        set: CalibrationSet::new(points),
        row_errors,
        rows_read,
    })
}

pub fn read_unknowns<R: Read>(source: R) -> Result<IngestedUnknowns, AppError> {
    let mut reader = csv_reader(source);
    let header_map = read_header_map(&mut reader)?;

    let label_idx = find_column(&header_map, LABEL_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `label`"))?;
    let abs_idx = find_column(&header_map, ABSORBANCE_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `absorbance`"))?;

    let mut samples = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if record.iter().all(|f| f.trim().is_empty()) {
            rows_read -= 1;
            continue;
        }

        let label = record.get(label_idx).unwrap_or("").trim();
        let label = if label.is_empty() {
            format!("row {line}")
        } else {
            label.to_string()
        };

        // Unparseable readings are "not entered yet", never a hard error.
        let raw = record.get(abs_idx).unwrap_or("");
        let absorbance = parse_reading(raw);
        if absorbance.is_none() && !raw.trim().is_empty() {
            tracing::warn!(line, value = raw, "non-numeric absorbance treated as not entered");
        }

        samples.push(UnknownSample::new(label, absorbance));
    }

    for e in &row_errors {
        tracing::warn!(line = e.line, "skipped unknown-sample row: {}", e.message);
    }

    Ok(IngestedUnknowns {
        samples,
        row_errors,
        rows_read,
    })
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

fn read_header_map<R: Read>(reader: &mut csv::Reader<R>) -> Result<HashMap<String, usize>, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    Ok(build_header_map(&headers))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes carry a UTF-8 BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

fn parse_standard(record: &StringRecord, conc_idx: usize, abs_idx: usize) -> Result<CalibrationPoint, String> {
    let conc = record.get(conc_idx).unwrap_or("");
    let abs = record.get(abs_idx).unwrap_or("");

    let concentration =
        parse_reading(conc).ok_or_else(|| format!("Missing/invalid `concentration` value '{conc}'."))?;
    let absorbance =
        parse_reading(abs).ok_or_else(|| format!("Missing/invalid `absorbance` value '{abs}'."))?;

    if concentration < 0.0 {
        return Err(format!("Concentration must be >= 0 (got {concentration})."));
    }

    Ok(CalibrationPoint::new(concentration, absorbance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_standards_with_aliases_and_bom() {
        let csv = "\u{feff}Glucose (mg/mL),Absorbance (AU)\n0,0.00\n0.1,0.05\n1,0.15\n";
        let out = read_standards(csv.as_bytes()).unwrap();
        assert_eq!(out.set.len(), 3);
        assert_eq!(out.set.points[1], CalibrationPoint::new(0.1, 0.05));
        assert!(out.row_errors.is_empty());
        assert_eq!(out.rows_read, 3);
    }

    #[test]
    fn bad_standard_rows_are_reported_and_skipped() {
        let csv = "concentration,absorbance\n0,0.0\n-1,0.2\nx,0.3\n2,\n4,0.55\n";
        let out = read_standards(csv.as_bytes()).unwrap();
        assert_eq!(out.set.len(), 2);
        let lines: Vec<usize> = out.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(out.row_errors[0].message.contains(">= 0"));
    }

    #[test]
    fn standards_without_valid_rows_fail() {
        let err = read_standards("concentration,absorbance\nx,y\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let err = read_standards("conc,signal\n0,0\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("absorbance"));
    }

    #[test]
    fn unknowns_allow_blank_and_text_readings() {
        let csv = "Dilution Factor,Absorbance (AU)\n1:1,\n1:5,0.42\n1:10,n/a\n,0.1\n";
        let out = read_unknowns(csv.as_bytes()).unwrap();
        assert_eq!(
            out.samples,
            vec![
                UnknownSample::new("1:1", None),
                UnknownSample::new("1:5", Some(0.42)),
                UnknownSample::new("1:10", None),
                UnknownSample::new("row 5", Some(0.1)),
            ]
        );
    }

    #[test]
    fn blank_lines_are_ignored() {
        let csv = "label,absorbance\n1:1,0.2\n,\n";
        let out = read_unknowns(csv.as_bytes()).unwrap();
        assert_eq!(out.samples.len(), 1);
        assert_eq!(out.rows_read, 1);
    }
}

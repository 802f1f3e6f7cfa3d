//! Report assembly.
//!
//! The report is the one-way export of a session: a CSV-like text record made
//! of titled blocks (calibration data, fit, unknown samples, final result).
//! Assembly is a pure serialization of already-derived values. Nothing is
//! recomputed here, and every unavailable value is written as an explicit
//! marker rather than an empty field.

use chrono::NaiveDateTime;

use crate::domain::{
    ABSORBANCE_UNIT, CONCENTRATION_UNIT, CalibrationSet, DilutionInput, DilutionOutcome,
    EstimationResult, FitRange, INVALID_FIT_MARKER, LinearFit, MISSING_MARKER, fmt_factor,
};
use crate::error::{AppError, FitError};

pub mod format;

pub use format::*;

pub const REPORT_TITLE: &str = "DNS Assay Standard Curve Report";
pub const NOT_CALCULATED_MARKER: &str = "not calculated";

/// Everything the report serializes.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub calibration: &'a CalibrationSet,
    /// The range the user asked for (shown even when the fit failed).
    pub range: &'a FitRange,
    pub fit: &'a Result<LinearFit, FitError>,
    pub estimates: &'a [EstimationResult],
    pub dilution_input: &'a DilutionInput,
    pub dilution: &'a DilutionOutcome,
    pub beverage: &'a str,
    /// Optional timestamp written into the header. Callers pass it in so the
    /// assembled text stays a function of its inputs.
    pub generated_at: Option<NaiveDateTime>,
}

type Row = Vec<String>;

/// Assemble the exportable report text.
pub fn assemble(inputs: &ReportInputs<'_>) -> Result<String, AppError> {
    let blocks = [
        header_block(inputs),
        calibration_block(inputs),
        fit_block(inputs),
        unknown_block(inputs),
        final_block(inputs),
    ];

    let mut out = String::new();
    for (idx, rows) in blocks.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(&write_block(rows)?);
    }
    Ok(out)
}

fn header_block(inputs: &ReportInputs<'_>) -> Vec<Row> {
    let mut rows = vec![
        row([REPORT_TITLE]),
        row(["Beverage".to_string(), beverage_label(inputs.beverage)]),
    ];
    if let Some(ts) = inputs.generated_at {
        rows.push(row([
            "Generated".to_string(),
            ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]));
    }
    rows
}

fn calibration_block(inputs: &ReportInputs<'_>) -> Vec<Row> {
    let mut rows = vec![
        row(["[Calibration data]"]),
        row([
            format!("Concentration ({CONCENTRATION_UNIT})"),
            format!("Absorbance ({ABSORBANCE_UNIT})"),
            "In fit range".to_string(),
        ]),
    ];
    for p in &inputs.calibration.points {
        let in_range = if inputs.range.contains(p.concentration) { "yes" } else { "no" };
        rows.push(row([
            format!("{:.3}", p.concentration),
            format!("{:.3}", p.absorbance),
            in_range.to_string(),
        ]));
    }
    rows
}

fn fit_block(inputs: &ReportInputs<'_>) -> Vec<Row> {
    let mut rows = vec![
        row(["[Linear fit]"]),
        row([
            format!("Fit range start ({CONCENTRATION_UNIT})"),
            format!("{:.3}", inputs.range.start),
        ]),
        row([
            format!("Fit range end ({CONCENTRATION_UNIT})"),
            format!("{:.3}", inputs.range.end),
        ]),
    ];

    match inputs.fit {
        Ok(fit) => {
            rows.push(row(["Points used".to_string(), fit.n_points.to_string()]));
            rows.push(row(["Equation".to_string(), fit.equation()]));
            rows.push(row(["Slope".to_string(), format!("{:.6}", fit.slope)]));
            rows.push(row(["Intercept".to_string(), format!("{:.6}", fit.intercept)]));
            rows.push(row(["R²".to_string(), fit.r_squared_display()]));
            rows.push(row(["Fit quality".to_string(), fit.quality().label().to_string()]));
        }
        Err(err) => {
            rows.push(row(["Equation", INVALID_FIT_MARKER]));
            rows.push(row(["Reason".to_string(), err.to_string()]));
        }
    }
    rows
}

fn unknown_block(inputs: &ReportInputs<'_>) -> Vec<Row> {
    let mut rows = vec![
        row([format!("[Unknown samples: {}]", beverage_label(inputs.beverage))]),
        row([
            "Dilution".to_string(),
            format!("Absorbance ({ABSORBANCE_UNIT})"),
            format!("Estimated concentration ({CONCENTRATION_UNIT})"),
        ]),
    ];
    for r in inputs.estimates {
        rows.push(row([
            r.sample.label.clone(),
            r.sample
                .absorbance
                .map(|a| format!("{a:.3}"))
                .unwrap_or_else(|| MISSING_MARKER.to_string()),
            r.estimate.to_string(),
        ]));
    }
    rows
}

fn final_block(inputs: &ReportInputs<'_>) -> Vec<Row> {
    let input = inputs.dilution_input;
    let mut rows = vec![
        row(["[Final concentration]"]),
        row([
            format!("Estimated concentration ({CONCENTRATION_UNIT})"),
            input
                .estimated_concentration
                .map(|c| format!("{c:.3}"))
                .unwrap_or_else(|| MISSING_MARKER.to_string()),
        ]),
        row([
            "Dilution factor".to_string(),
            input
                .dilution_factor
                .map(fmt_factor)
                .unwrap_or_else(|| MISSING_MARKER.to_string()),
        ]),
    ];

    let label = format!("Original concentration ({CONCENTRATION_UNIT})");
    match inputs.dilution {
        DilutionOutcome::Corrected(c) => {
            rows.push(row([label, format!("{:.3}", c.original_concentration)]));
        }
        DilutionOutcome::Unavailable { reason } => {
            rows.push(row([label, NOT_CALCULATED_MARKER.to_string()]));
            rows.push(row(["Reason".to_string(), reason.message().to_string()]));
        }
    }
    rows
}

fn beverage_label(beverage: &str) -> String {
    let trimmed = beverage.trim();
    if trimmed.is_empty() {
        "unnamed sample".to_string()
    } else {
        trimmed.to_string()
    }
}

fn row<S: Into<String>, const N: usize>(fields: [S; N]) -> Row {
    fields.into_iter().map(Into::into).collect()
}

fn write_block(rows: &[Row]) -> Result<String, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for r in rows {
        writer
            .write_record(r)
            .map_err(|e| AppError::new(4, format!("Failed to write report row: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::new(4, format!("Failed to finish report block: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::new(4, format!("Report is not valid UTF-8: {e}")))
}

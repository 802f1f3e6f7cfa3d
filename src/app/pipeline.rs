//! Shared session pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! standards -> fit -> per-row estimates -> dilution correction -> report
//!
//! `recompute` is a pure function of the session inputs. Front-ends call it
//! after every edit and never patch derived values in place.

use chrono::NaiveDateTime;

use crate::domain::{
    CalibrationSet, DilutionInput, DilutionOutcome, EstimationResult, FitRange, LinearFit,
    SessionConfig, UnknownSample,
};
use crate::error::{AppError, FitError};
use crate::estimate::{correct_for_dilution, estimate_all};
use crate::fit::fit;
use crate::io::ingest::{RowError, load_standards, load_unknowns};
use crate::report::{ReportInputs, assemble};

/// Everything the user can edit in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInputs {
    pub calibration: CalibrationSet,
    pub range: FitRange,
    pub unknowns: Vec<UnknownSample>,
    pub beverage: String,
    pub dilution: DilutionInput,
}

impl Default for SessionInputs {
    fn default() -> Self {
        let calibration = CalibrationSet::default_glucose();
        let range = resolve_range(&calibration, None, None);
        Self {
            calibration,
            range,
            unknowns: UnknownSample::default_rows(),
            beverage: crate::domain::DEFAULT_BEVERAGE.to_string(),
            dilution: DilutionInput::default(),
        }
    }
}

/// Session inputs plus any rows that were skipped while loading them.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub inputs: SessionInputs,
    pub standards_errors: Vec<RowError>,
    pub unknowns_errors: Vec<RowError>,
}

/// All derived values of one recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutput {
    pub fit: Result<LinearFit, FitError>,
    pub estimates: Vec<EstimationResult>,
    pub dilution: DilutionOutcome,
}

impl SessionOutput {
    pub fn valid_fit(&self) -> Option<&LinearFit> {
        self.fit.as_ref().ok()
    }
}

/// Build session inputs from config: CSV files when given, defaults otherwise.
pub fn load_session(config: &SessionConfig) -> Result<LoadedSession, AppError> {
    let (calibration, standards_errors) = match &config.standards_path {
        Some(path) => {
            let ingest = load_standards(path)?;
            tracing::info!(
                path = %path.display(),
                rows_read = ingest.rows_read,
                rows_used = ingest.set.len(),
                "loaded calibration standards"
            );
            (ingest.set, ingest.row_errors)
        }
        None => (CalibrationSet::default_glucose(), Vec::new()),
    };

    let (unknowns, unknowns_errors) = match &config.unknowns_path {
        Some(path) => {
            let ingest = load_unknowns(path)?;
            tracing::info!(
                path = %path.display(),
                rows_read = ingest.rows_read,
                rows_used = ingest.samples.len(),
                "loaded unknown samples"
            );
            (ingest.samples, ingest.row_errors)
        }
        None => (UnknownSample::default_rows(), Vec::new()),
    };

    let range = resolve_range(&calibration, config.range_start, config.range_end);

    Ok(LoadedSession {
        inputs: SessionInputs {
            calibration,
            range,
            unknowns,
            beverage: config.beverage.clone(),
            dilution: config.dilution,
        },
        standards_errors,
        unknowns_errors,
    })
}

/// Resolve requested bounds against the observed concentration domain.
///
/// Missing bounds default to the domain edges and given bounds are clamped into
/// it. Reversed bounds are kept as-is so the fitter reports them.
pub fn resolve_range(calibration: &CalibrationSet, start: Option<f64>, end: Option<f64>) -> FitRange {
    match calibration.concentration_domain() {
        Some((lo, hi)) => FitRange {
            start: start.unwrap_or(lo),
            end: end.unwrap_or(hi),
        }
        .clamp_to((lo, hi)),
        None => FitRange {
            start: start.unwrap_or(0.0),
            end: end.unwrap_or(0.0),
        },
    }
}

/// Recompute every derived value from scratch.
pub fn recompute(inputs: &SessionInputs) -> SessionOutput {
    let fit = fit(&inputs.calibration, &inputs.range);
    let valid = fit.as_ref().ok();

    let estimates = estimate_all(valid, &inputs.unknowns);
    let dilution = correct_for_dilution(
        valid,
        inputs.dilution.estimated_concentration,
        inputs.dilution.dilution_factor,
    );

    SessionOutput {
        fit,
        estimates,
        dilution,
    }
}

/// Assemble the export report for a recomputed session.
pub fn build_report(
    inputs: &SessionInputs,
    output: &SessionOutput,
    generated_at: Option<NaiveDateTime>,
) -> Result<String, AppError> {
    assemble(&ReportInputs {
        calibration: &inputs.calibration,
        range: &inputs.range,
        fit: &output.fit,
        estimates: &output.estimates,
        dilution_input: &inputs.dilution,
        dilution: &output.dilution,
        beverage: &inputs.beverage,
        generated_at,
    })
}

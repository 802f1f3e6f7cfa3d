//! JSON snapshot of a session.
//!
//! The snapshot is the machine-readable twin of the text report:
//! - the inputs the user edited (standards, range, rows, dilution inputs)
//! - every derived value (fit or fit error, per-row estimates, final result)
//!
//! It is write-only; the tool never loads a snapshot back.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::app::pipeline::{SessionInputs, SessionOutput};
use crate::domain::{
    CalibrationSet, DilutionInput, DilutionOutcome, EstimationResult, FitQuality, FitRange,
    LinearFit, UnknownSample,
};
use crate::error::{AppError, FitError};

#[derive(Debug, Serialize)]
pub struct SessionSnapshot<'a> {
    pub tool: &'static str,
    pub generated_at: Option<NaiveDateTime>,
    pub beverage: &'a str,
    pub calibration: &'a CalibrationSet,
    pub range: &'a FitRange,
    pub fit: FitSnapshot<'a>,
    pub unknowns: &'a [UnknownSample],
    pub estimates: &'a [EstimationResult],
    pub dilution_input: &'a DilutionInput,
    pub dilution: &'a DilutionOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitSnapshot<'a> {
    Fitted {
        #[serde(flatten)]
        fit: &'a LinearFit,
        equation: String,
        quality: FitQuality,
    },
    Failed {
        error: &'a FitError,
    },
}

impl<'a> SessionSnapshot<'a> {
    pub fn new(
        inputs: &'a SessionInputs,
        output: &'a SessionOutput,
        generated_at: Option<NaiveDateTime>,
    ) -> Self {
        let fit = match &output.fit {
            Ok(fit) => FitSnapshot::Fitted {
                fit,
                equation: fit.equation(),
                quality: fit.quality(),
            },
            Err(error) => FitSnapshot::Failed { error },
        };
        Self {
            tool: "stdcurve",
            generated_at,
            beverage: &inputs.beverage,
            calibration: &inputs.calibration,
            range: &inputs.range,
            fit,
            unknowns: &inputs.unknowns,
            estimates: &output.estimates,
            dilution_input: &inputs.dilution,
            dilution: &output.dilution,
        }
    }
}

/// Write a pretty-printed session snapshot.
pub fn write_session_json(path: &Path, snapshot: &SessionSnapshot<'_>) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create session JSON '{}': {e}", path.display()),
        )
    })?;

    serde_json::to_writer_pretty(file, snapshot)
        .map_err(|e| AppError::new(2, format!("Failed to write session JSON: {e}")))?;

    tracing::info!(path = %path.display(), "wrote session snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::recompute;

    #[test]
    fn snapshot_tags_fit_and_estimates() {
        let mut inputs = SessionInputs::default();
        inputs.unknowns[0].absorbance = Some(0.3);
        let output = recompute(&inputs);

        let value = serde_json::to_value(SessionSnapshot::new(&inputs, &output, None)).unwrap();
        assert_eq!(value["tool"], "stdcurve");
        assert_eq!(value["fit"]["status"], "fitted");
        assert_eq!(value["fit"]["n_points"], 8);
        assert_eq!(value["estimates"][0]["estimate"]["status"], "value");
        assert_eq!(value["estimates"][0]["estimate"]["value"], 2.168);
        assert_eq!(value["estimates"][1]["estimate"]["status"], "missing");
        assert_eq!(value["dilution"]["status"], "unavailable");
        assert_eq!(value["dilution"]["reason"], "incomplete_inputs");
    }

    #[test]
    fn failed_fit_serializes_the_error() {
        let mut inputs = SessionInputs::default();
        inputs.range = FitRange { start: 3.0, end: 5.0 };
        let output = recompute(&inputs);

        let value = serde_json::to_value(SessionSnapshot::new(&inputs, &output, None)).unwrap();
        assert_eq!(value["fit"]["status"], "failed");
        assert_eq!(value["fit"]["error"]["kind"], "insufficient_data");
        assert_eq!(value["fit"]["error"]["points"], 1);
    }

    #[test]
    fn writes_json_file() {
        let inputs = SessionInputs::default();
        let output = recompute(&inputs);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        write_session_json(&path, &SessionSnapshot::new(&inputs, &output, None)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["beverage"], "Orange Soda");
    }
}

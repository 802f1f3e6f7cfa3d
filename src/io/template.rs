//! Starter CSV templates.
//!
//! `stdcurve template` writes the default glucose standards and the default
//! dilution rows so a class can fill in their own readings.

use std::path::{Path, PathBuf};

use crate::domain::{CalibrationSet, UnknownSample};
use crate::error::AppError;

pub const STANDARDS_TEMPLATE: &str = "standards.csv";
pub const UNKNOWNS_TEMPLATE: &str = "unknowns.csv";

/// Paths written by [`write_templates`].
#[derive(Debug, Clone)]
pub struct TemplatePaths {
    pub standards: PathBuf,
    pub unknowns: PathBuf,
}

/// Write `standards.csv` and `unknowns.csv` into `dir`.
///
/// Existing files are left alone unless `overwrite` is set.
pub fn write_templates(dir: &Path, overwrite: bool) -> Result<TemplatePaths, AppError> {
    let paths = TemplatePaths {
        standards: dir.join(STANDARDS_TEMPLATE),
        unknowns: dir.join(UNKNOWNS_TEMPLATE),
    };

    if !overwrite {
        for p in [&paths.standards, &paths.unknowns] {
            if p.exists() {
                return Err(AppError::new(
                    2,
                    format!("'{}' already exists (use --force to overwrite).", p.display()),
                ));
            }
        }
    }

    write_standards_csv(&paths.standards, &CalibrationSet::default_glucose())?;
    write_unknowns_csv(&paths.unknowns, &UnknownSample::default_rows())?;

    tracing::info!(dir = %dir.display(), "wrote CSV templates");
    Ok(paths)
}

fn write_standards_csv(path: &Path, set: &CalibrationSet) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    writer
        .write_record(["concentration", "absorbance"])
        .map_err(|e| AppError::new(2, format!("Failed to write template header: {e}")))?;
    for p in &set.points {
        writer
            .write_record([p.concentration.to_string(), format!("{:.2}", p.absorbance)])
            .map_err(|e| AppError::new(2, format!("Failed to write template row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))
}

fn write_unknowns_csv(path: &Path, rows: &[UnknownSample]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    writer
        .write_record(["label", "absorbance"])
        .map_err(|e| AppError::new(2, format!("Failed to write template header: {e}")))?;
    for r in rows {
        let abs = r.absorbance.map(|a| a.to_string()).unwrap_or_default();
        writer
            .write_record([r.label.as_str(), abs.as_str()])
            .map_err(|e| AppError::new(2, format!("Failed to write template row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::{load_standards, load_unknowns};

    #[test]
    fn templates_load_back_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_templates(dir.path(), false).unwrap();

        let standards = load_standards(&paths.standards).unwrap();
        assert_eq!(standards.set, CalibrationSet::default_glucose());

        let unknowns = load_unknowns(&paths.unknowns).unwrap();
        assert_eq!(unknowns.samples, UnknownSample::default_rows());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(dir.path(), false).unwrap();
        let err = write_templates(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(write_templates(dir.path(), true).is_ok());
    }
}

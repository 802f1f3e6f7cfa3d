//! Export the assembled report to a file.
//!
//! The report is meant to be easy to open in spreadsheets; it is never read back.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;

/// Write the report text to `path`, replacing any existing file.
pub fn write_report(path: &Path, report: &str) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report '{}': {e}", path.display())))?;

    file.write_all(report.as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write report: {e}")))?;

    tracing::info!(path = %path.display(), bytes = report.len(), "wrote report");
    Ok(())
}

/// Default report file name for a beverage, e.g. `orange_soda_standard_curve.csv`.
pub fn default_report_name(beverage: &str) -> String {
    let mut slug = String::new();
    let mut last_was_sep = true;
    for ch in beverage.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "standard_curve.csv".to_string()
    } else {
        format!("{slug}_standard_curve.csv")
    }
}

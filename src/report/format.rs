//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting/estimation code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{
    ABSORBANCE_UNIT, CONCENTRATION_UNIT, CalibrationSet, DilutionOutcome, EstimationResult,
    FitQuality, FitRange, INVALID_FIT_MARKER, LinearFit, MISSING_MARKER, MessageLevel,
};
use crate::error::FitError;

/// Fit summary: range, equation, R² and any advisory.
pub fn format_fit_summary(
    calibration: &CalibrationSet,
    range: &FitRange,
    fit: &Result<LinearFit, FitError>,
) -> String {
    let mut out = String::new();

    out.push_str("=== stdcurve - Standard Curve ===\n");
    out.push_str(&format!(
        "Standards: n={} | fit range=[{:.3}, {:.3}] {CONCENTRATION_UNIT}\n",
        calibration.len(),
        range.start,
        range.end,
    ));

    match fit {
        Ok(fit) => {
            out.push_str(&format!("Points in range: {}\n", fit.n_points));
            out.push_str(&format!("Linear fit: {}\n", fit.equation()));
            out.push_str(&format!("R²: {}\n", fit.r_squared_display()));
            match fit.quality() {
                FitQuality::Good => {}
                FitQuality::Advisory => out.push_str(
                    "[warn] R² is below 0.95: the selected range may include non-linear points.\n",
                ),
                FitQuality::Undefined => out.push_str(
                    "[warn] Absorbance does not vary over the selected range; no usable slope.\n",
                ),
            }
        }
        Err(err) => {
            out.push_str(&format!("Linear fit: {INVALID_FIT_MARKER}\n"));
            out.push_str(&format!("[warn] {err}\n"));
        }
    }

    out
}

/// Calibration table with an in-range marker column.
pub fn format_calibration_table(calibration: &CalibrationSet, range: &FitRange) -> String {
    let mut out = String::new();
    out.push_str("Calibration standards:\n");
    push_row(
        &mut out,
        format!(
            "{:>4} {:>16} {:>16} {:<8}",
            "#",
            format!("conc ({CONCENTRATION_UNIT})"),
            format!("abs ({ABSORBANCE_UNIT})"),
            "in range"
        ),
    );
    push_row(
        &mut out,
        format!("{:-<4} {:-<16} {:-<16} {:-<8}", "", "", "", ""),
    );

    for (idx, p) in calibration.points.iter().enumerate() {
        let mark = if range.contains(p.concentration) { "*" } else { "" };
        push_row(
            &mut out,
            format!(
                "{:>4} {:>16.3} {:>16.3} {:<8}",
                idx + 1,
                p.concentration,
                p.absorbance,
                mark
            ),
        );
    }

    out
}

/// Unknown-sample table augmented with the estimate column.
pub fn format_estimates(beverage: &str, estimates: &[EstimationResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Unknown samples ({}):\n", beverage.trim()));
    push_row(
        &mut out,
        format!(
            "{:<12} {:>14} {:>24}",
            "dilution",
            format!("abs ({ABSORBANCE_UNIT})"),
            format!("estimate ({CONCENTRATION_UNIT})")
        ),
    );
    push_row(&mut out, format!("{:-<12} {:-<14} {:-<24}", "", "", ""));

    for r in estimates {
        let abs = r
            .sample
            .absorbance
            .map(|a| format!("{a:.3}"))
            .unwrap_or_else(|| MISSING_MARKER.to_string());
        push_row(
            &mut out,
            format!(
                "{:<12} {:>14} {:>24}",
                truncate(&r.sample.label, 12),
                abs,
                r.estimate.to_string()
            ),
        );
    }

    out
}

/// Dilution-corrected result as a single status line.
pub fn format_dilution(outcome: &DilutionOutcome, beverage: &str) -> String {
    let tag = match outcome.level() {
        MessageLevel::Success => "[ok]",
        MessageLevel::Info => "[info]",
        MessageLevel::Warning => "[warn]",
    };
    format!("{tag} {}\n", outcome.message(beverage.trim()))
}

fn push_row(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

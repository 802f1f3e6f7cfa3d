//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - recomputed from scratch on every edit
//! - rendered by the terminal front-ends
//! - exported to the report and the JSON session snapshot

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// R² below this value flags the fit with an advisory (the fit stays usable).
pub const R_SQUARED_ADVISORY_THRESHOLD: f64 = 0.95;

/// Unit label used for concentrations throughout the tool.
pub const CONCENTRATION_UNIT: &str = "mg/mL";

/// Unit label used for absorbance readings.
pub const ABSORBANCE_UNIT: &str = "AU";

/// Default DNS glucose standards (concentration mg/mL, absorbance AU).
pub const DEFAULT_STANDARDS: [(f64, f64); 8] = [
    (0.0, 0.00),
    (0.1, 0.05),
    (1.0, 0.15),
    (2.0, 0.30),
    (4.0, 0.55),
    (6.0, 0.80),
    (8.0, 1.00),
    (10.0, 1.20),
];

/// Default dilution rows offered for the unknown beverage.
pub const DEFAULT_DILUTION_LABELS: [&str; 4] = ["1:1", "1:5", "1:10", "Other"];

pub const DEFAULT_BEVERAGE: &str = "Orange Soda";

/// One calibration standard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Known concentration (≥ 0).
    pub concentration: f64,
    /// Measured absorbance.
    pub absorbance: f64,
}

impl CalibrationPoint {
    pub fn new(concentration: f64, absorbance: f64) -> Self {
        Self {
            concentration,
            absorbance,
        }
    }
}

/// Ordered calibration table. Order is kept for display; fitting ignores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSet {
    pub points: Vec<CalibrationPoint>,
}

impl CalibrationSet {
    pub fn new(points: Vec<CalibrationPoint>) -> Self {
        Self { points }
    }

    /// The default glucose standard series.
    pub fn default_glucose() -> Self {
        Self::new(
            DEFAULT_STANDARDS
                .iter()
                .map(|&(c, a)| CalibrationPoint::new(c, a))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(min, max)` of the finite concentrations, or `None` for an empty table.
    pub fn concentration_domain(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for p in &self.points {
            if p.concentration.is_finite() {
                lo = lo.min(p.concentration);
                hi = hi.max(p.concentration);
            }
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }
}

/// Closed concentration interval selecting the points used for fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitRange {
    pub start: f64,
    pub end: f64,
}

impl FitRange {
    pub fn new(start: f64, end: f64) -> Result<Self, FitError> {
        if !(start.is_finite() && end.is_finite()) || start > end {
            return Err(FitError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The range covering every observed concentration.
    pub fn full(set: &CalibrationSet) -> Option<Self> {
        set.concentration_domain()
            .map(|(start, end)| Self { start, end })
    }

    pub fn contains(&self, concentration: f64) -> bool {
        self.start <= concentration && concentration <= self.end
    }

    /// Clamp each bound into `domain` independently.
    ///
    /// Bound order is left alone: a reversed range stays reversed so the
    /// fitter can report it.
    pub fn clamp_to(self, domain: (f64, f64)) -> Self {
        let (lo, hi) = domain;
        Self {
            start: self.start.clamp(lo, hi),
            end: self.end.clamp(lo, hi),
        }
    }
}

/// Fit quality classification derived from R².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitQuality {
    Good,
    /// R² below [`R_SQUARED_ADVISORY_THRESHOLD`].
    Advisory,
    /// Correlation undefined (absorbances in range are all identical).
    Undefined,
}

impl FitQuality {
    pub fn label(self) -> &'static str {
        match self {
            FitQuality::Good => "ok",
            FitQuality::Advisory => "below 0.95 threshold (check linear region)",
            FitQuality::Undefined => "undefined (no variation in absorbance)",
        }
    }
}

/// Ordinary least squares line `A = slope × C + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: Option<f64>,
    /// Number of calibration points inside `range`.
    pub n_points: usize,
    pub range: FitRange,
}

impl LinearFit {
    pub fn predict(&self, concentration: f64) -> f64 {
        self.slope * concentration + self.intercept
    }

    /// Whether the line can be inverted to map absorbance back to concentration.
    pub fn is_invertible(&self) -> bool {
        self.slope.is_finite() && self.intercept.is_finite() && self.slope != 0.0
    }

    pub fn quality(&self) -> FitQuality {
        match self.r_squared {
            Some(r2) if r2 < R_SQUARED_ADVISORY_THRESHOLD => FitQuality::Advisory,
            Some(_) => FitQuality::Good,
            None => FitQuality::Undefined,
        }
    }

    pub fn equation(&self) -> String {
        format!("A = {:.3} × C + {:.3}", self.slope, self.intercept)
    }

    pub fn r_squared_display(&self) -> String {
        self.r_squared
            .map(|r2| format!("{r2:.3}"))
            .unwrap_or_else(|| "undefined".to_string())
    }
}

/// One row of the unknown-sample table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownSample {
    /// Dilution descriptor, e.g. `1:10`.
    pub label: String,
    pub absorbance: Option<f64>,
}

impl UnknownSample {
    pub fn new(label: impl Into<String>, absorbance: Option<f64>) -> Self {
        Self {
            label: label.into(),
            absorbance,
        }
    }

    /// The default dilution rows with no readings entered.
    pub fn default_rows() -> Vec<Self> {
        DEFAULT_DILUTION_LABELS
            .iter()
            .map(|label| Self::new(*label, None))
            .collect()
    }
}

/// Parse a free-text numeric cell. Empty, non-numeric and non-finite input is missing.
pub fn parse_reading(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub const MISSING_MARKER: &str = "not entered";
pub const INVALID_FIT_MARKER: &str = "no valid linear fit";

/// Back-calculated concentration for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Estimate {
    /// Concentration rounded to 3 decimals.
    Value(f64),
    /// Raw result was negative (sub-blank absorbance); reported as 0.0.
    NegativeClamped,
    /// No absorbance entered yet.
    Missing,
    /// No usable calibration line.
    InvalidFit,
}

impl std::fmt::Display for Estimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Estimate::Value(v) => write!(f, "{v:.3}"),
            Estimate::NegativeClamped => write!(f, "{:.3}", 0.0),
            Estimate::Missing => f.write_str(MISSING_MARKER),
            Estimate::InvalidFit => f.write_str(INVALID_FIT_MARKER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationResult {
    pub sample: UnknownSample,
    pub estimate: Estimate,
}

/// Manually transcribed dilution inputs.
///
/// The estimate is typed in by the user; it is never looked up from the
/// unknown-sample table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DilutionInput {
    pub estimated_concentration: Option<f64>,
    pub dilution_factor: Option<f64>,
}

impl Default for DilutionInput {
    fn default() -> Self {
        Self {
            estimated_concentration: None,
            dilution_factor: Some(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DilutionCorrection {
    pub estimated_concentration: f64,
    pub dilution_factor: f64,
    pub original_concentration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The calibration line is missing or degenerate.
    InvalidFit,
    /// Estimate not > 0 or factor not ≥ 1 (treated as "not entered yet").
    IncompleteInputs,
}

impl UnavailableReason {
    pub fn message(self) -> &'static str {
        match self {
            UnavailableReason::InvalidFit => {
                "Cannot correct for dilution: no valid linear fit. Adjust the standards or fit range."
            }
            UnavailableReason::IncompleteInputs => {
                "Enter an estimated concentration above 0 and a dilution factor of at least 1."
            }
        }
    }
}

/// How a front-end should present a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Success,
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DilutionOutcome {
    Corrected(DilutionCorrection),
    Unavailable { reason: UnavailableReason },
}

impl DilutionOutcome {
    pub fn original_concentration(&self) -> Option<f64> {
        match self {
            DilutionOutcome::Corrected(c) => Some(c.original_concentration),
            DilutionOutcome::Unavailable { .. } => None,
        }
    }

    pub fn level(&self) -> MessageLevel {
        match self {
            DilutionOutcome::Corrected(_) => MessageLevel::Success,
            DilutionOutcome::Unavailable {
                reason: UnavailableReason::IncompleteInputs,
            } => MessageLevel::Info,
            DilutionOutcome::Unavailable {
                reason: UnavailableReason::InvalidFit,
            } => MessageLevel::Warning,
        }
    }

    /// User-facing message. `beverage` names the sample in the success text.
    pub fn message(&self, beverage: &str) -> String {
        match self {
            DilutionOutcome::Corrected(c) => format!(
                "Original {beverage} concentration: {:.3} {CONCENTRATION_UNIT} ({:.3} × {})",
                c.original_concentration,
                c.estimated_concentration,
                fmt_factor(c.dilution_factor),
            ),
            DilutionOutcome::Unavailable { reason } => reason.message().to_string(),
        }
    }
}

/// Render a dilution factor without trailing zeros for whole numbers.
pub fn fmt_factor(factor: f64) -> String {
    if factor.fract() == 0.0 && factor.abs() < 1e15 {
        format!("{factor:.0}")
    } else {
        format!("{factor}")
    }
}

/// A full session's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub standards_path: Option<PathBuf>,
    pub unknowns_path: Option<PathBuf>,
    pub range_start: Option<f64>,
    pub range_end: Option<f64>,
    pub beverage: String,
    pub dilution: DilutionInput,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_report: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            standards_path: None,
            unknowns_path: None,
            range_start: None,
            range_end: None,
            beverage: DEFAULT_BEVERAGE.to_string(),
            dilution: DilutionInput::default(),
            plot: true,
            plot_width: 72,
            plot_height: 20,
            export_report: None,
            export_json: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_range_rejects_reversed_bounds() {
        assert!(FitRange::new(0.0, 10.0).is_ok());
        assert!(FitRange::new(2.0, 2.0).is_ok());
        assert_eq!(
            FitRange::new(5.0, 1.0),
            Err(FitError::InvalidRange { start: 5.0, end: 1.0 })
        );
        assert!(FitRange::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn fit_range_is_closed() {
        let r = FitRange::new(1.0, 4.0).unwrap();
        assert!(r.contains(1.0));
        assert!(r.contains(4.0));
        assert!(!r.contains(4.0001));
    }

    #[test]
    fn clamp_to_keeps_bounds_inside_domain() {
        let r = FitRange { start: -3.0, end: 50.0 }.clamp_to((0.0, 10.0));
        assert_eq!(r, FitRange { start: 0.0, end: 10.0 });

        let r = FitRange { start: 12.0, end: 15.0 }.clamp_to((0.0, 10.0));
        assert_eq!(r, FitRange { start: 10.0, end: 10.0 });

        let r = FitRange { start: 8.0, end: -1.0 }.clamp_to((0.0, 10.0));
        assert_eq!(r, FitRange { start: 8.0, end: 0.0 });
    }

    #[test]
    fn default_set_spans_zero_to_ten() {
        let set = CalibrationSet::default_glucose();
        assert_eq!(set.len(), 8);
        assert_eq!(set.concentration_domain(), Some((0.0, 10.0)));
        assert_eq!(FitRange::full(&set), Some(FitRange { start: 0.0, end: 10.0 }));
        assert_eq!(CalibrationSet::default().concentration_domain(), None);
    }

    #[test]
    fn parse_reading_treats_blank_and_text_as_missing() {
        assert_eq!(parse_reading(" 0.42 "), Some(0.42));
        assert_eq!(parse_reading(""), None);
        assert_eq!(parse_reading("   "), None);
        assert_eq!(parse_reading("abc"), None);
        assert_eq!(parse_reading("NaN"), None);
        assert_eq!(parse_reading("inf"), None);
    }

    #[test]
    fn estimate_markers_are_distinct() {
        assert_eq!(Estimate::Value(1.5).to_string(), "1.500");
        assert_eq!(Estimate::NegativeClamped.to_string(), "0.000");
        assert_eq!(Estimate::Missing.to_string(), MISSING_MARKER);
        assert_eq!(Estimate::InvalidFit.to_string(), INVALID_FIT_MARKER);
        assert_ne!(Estimate::Missing.to_string(), Estimate::InvalidFit.to_string());
    }

    #[test]
    fn quality_follows_threshold() {
        let mut fit = LinearFit {
            slope: 1.0,
            intercept: 0.0,
            r_squared: Some(0.99),
            n_points: 3,
            range: FitRange { start: 0.0, end: 1.0 },
        };
        assert_eq!(fit.quality(), FitQuality::Good);
        fit.r_squared = Some(0.94);
        assert_eq!(fit.quality(), FitQuality::Advisory);
        fit.r_squared = None;
        assert_eq!(fit.quality(), FitQuality::Undefined);
    }

    #[test]
    fn equation_uses_three_decimals() {
        let fit = LinearFit {
            slope: 0.119_975,
            intercept: 0.039_844,
            r_squared: Some(0.9957),
            n_points: 8,
            range: FitRange { start: 0.0, end: 10.0 },
        };
        assert_eq!(fit.equation(), "A = 0.120 × C + 0.040");
        assert_eq!(fit.r_squared_display(), "0.996");
    }

    #[test]
    fn dilution_messages_by_level() {
        let ok = DilutionOutcome::Corrected(DilutionCorrection {
            estimated_concentration: 0.5,
            dilution_factor: 10.0,
            original_concentration: 5.0,
        });
        assert_eq!(ok.level(), MessageLevel::Success);
        assert_eq!(
            ok.message("Cola"),
            "Original Cola concentration: 5.000 mg/mL (0.500 × 10)"
        );

        let waiting = DilutionOutcome::Unavailable {
            reason: UnavailableReason::IncompleteInputs,
        };
        assert_eq!(waiting.level(), MessageLevel::Info);

        let blocked = DilutionOutcome::Unavailable {
            reason: UnavailableReason::InvalidFit,
        };
        assert_eq!(blocked.level(), MessageLevel::Warning);
        assert!(blocked.message("Cola").contains("no valid linear fit"));
    }
}

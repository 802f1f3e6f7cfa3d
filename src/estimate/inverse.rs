//! Inverse estimation: absorbance → concentration.
//!
//! Each unknown row is estimated independently through
//! `C = (A - intercept) / slope`, rounded to 3 decimals and floored at zero
//! (sub-blank absorbance means no measurable analyte).

use crate::domain::{Estimate, EstimationResult, LinearFit, UnknownSample};
use crate::math::round3;

/// Estimate the concentration behind one absorbance reading.
pub fn estimate(fit: Option<&LinearFit>, absorbance: Option<f64>) -> Estimate {
    let Some(absorbance) = absorbance.filter(|a| a.is_finite()) else {
        return Estimate::Missing;
    };
    let Some(fit) = fit.filter(|f| f.is_invertible()) else {
        return Estimate::InvalidFit;
    };

    let raw = (absorbance - fit.intercept) / fit.slope;
    if !raw.is_finite() {
        return Estimate::InvalidFit;
    }
    if raw < 0.0 {
        return Estimate::NegativeClamped;
    }
    Estimate::Value(round3(raw))
}

/// Estimate every unknown row, preserving order.
pub fn estimate_all(fit: Option<&LinearFit>, unknowns: &[UnknownSample]) -> Vec<EstimationResult> {
    unknowns
        .iter()
        .map(|sample| EstimationResult {
            sample: sample.clone(),
            estimate: estimate(fit, sample.absorbance),
        })
        .collect()
}

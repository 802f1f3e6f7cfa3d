//! Dilution correction.
//!
//! The user transcribes one diluted-sample estimate by hand together with the
//! dilution factor used; the engine never picks a row on its own.

use crate::domain::{DilutionCorrection, DilutionOutcome, LinearFit, UnavailableReason};

/// Recover the original-sample concentration: `estimate × factor`.
///
/// The fit is checked first and independently of the numeric inputs so a
/// broken calibration is reported as the blocking factor.
pub fn correct_for_dilution(
    fit: Option<&LinearFit>,
    estimated_concentration: Option<f64>,
    dilution_factor: Option<f64>,
) -> DilutionOutcome {
    if !fit.is_some_and(LinearFit::is_invertible) {
        return DilutionOutcome::Unavailable {
            reason: UnavailableReason::InvalidFit,
        };
    }

    let estimate = estimated_concentration.filter(|c| c.is_finite() && *c > 0.0);
    let factor = dilution_factor.filter(|f| f.is_finite() && *f >= 1.0);
    let (Some(estimated_concentration), Some(dilution_factor)) = (estimate, factor) else {
        return DilutionOutcome::Unavailable {
            reason: UnavailableReason::IncompleteInputs,
        };
    };

    DilutionOutcome::Corrected(DilutionCorrection {
        estimated_concentration,
        dilution_factor,
        original_concentration: estimated_concentration * dilution_factor,
    })
}

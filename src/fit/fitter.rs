//! Calibration fitter.
//!
//! Given:
//! - a calibration table of `(concentration, absorbance)` standards
//! - a closed concentration range selecting the linear region
//!
//! we fit an ordinary least squares line through the selected standards and
//! report slope, intercept and R². A low R² is an advisory, not an error: the
//! line is still returned and usable.

use crate::domain::{CalibrationPoint, CalibrationSet, FitQuality, FitRange, LinearFit};
use crate::error::FitError;
use crate::math::simple_linear_regression;

/// Fit the standard curve over `range`.
pub fn fit(points: &CalibrationSet, range: &FitRange) -> Result<LinearFit, FitError> {
    // Ranges can be built by struct literal, so re-check the invariant here.
    let range = FitRange::new(range.start, range.end)?;

    let selected = select_in_range(points, &range);
    let x: Vec<f64> = selected.iter().map(|p| p.concentration).collect();
    let y: Vec<f64> = selected.iter().map(|p| p.absorbance).collect();

    let distinct = count_distinct(&x);
    if x.len() < 2 || distinct < 2 {
        tracing::debug!(
            points = x.len(),
            distinct,
            start = range.start,
            end = range.end,
            "not enough calibration data in range"
        );
        return Err(FitError::InsufficientData {
            points: x.len(),
            distinct,
        });
    }

    let stats = simple_linear_regression(&x, &y).ok_or(FitError::InsufficientData {
        points: x.len(),
        distinct,
    })?;

    let fit = LinearFit {
        slope: stats.slope,
        intercept: stats.intercept,
        r_squared: stats.r_squared,
        n_points: x.len(),
        range,
    };

    tracing::debug!(
        slope = fit.slope,
        intercept = fit.intercept,
        r_squared = ?fit.r_squared,
        n = fit.n_points,
        "fitted standard curve"
    );
    if fit.quality() == FitQuality::Advisory {
        tracing::warn!(
            r_squared = ?fit.r_squared,
            "R² is below 0.95; the selected range may not be linear"
        );
    }

    Ok(fit)
}

/// Standards whose concentration lies in `range`, in table order.
pub fn select_in_range(points: &CalibrationSet, range: &FitRange) -> Vec<CalibrationPoint> {
    points
        .points
        .iter()
        .filter(|p| p.concentration.is_finite() && p.absorbance.is_finite())
        .filter(|p| range.contains(p.concentration))
        .copied()
        .collect()
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::sum_squared_residuals;

    fn set(pairs: &[(f64, f64)]) -> CalibrationSet {
        CalibrationSet::new(
            pairs
                .iter()
                .map(|&(c, a)| CalibrationPoint::new(c, a))
                .collect(),
        )
    }

    fn range(start: f64, end: f64) -> FitRange {
        FitRange::new(start, end).unwrap()
    }

    #[test]
    fn default_standards_fit_full_range() {
        let fit = fit(&CalibrationSet::default_glucose(), &range(0.0, 10.0)).unwrap();
        assert_relative_eq!(fit.slope, 0.119_975_776, epsilon = 1e-8);
        assert_relative_eq!(fit.intercept, 0.039_844_169, epsilon = 1e-8);
        assert!(fit.r_squared.unwrap() > 0.95);
        assert_eq!(fit.n_points, 8);
        assert_eq!(fit.quality(), FitQuality::Good);
    }

    #[test]
    fn range_filter_is_inclusive() {
        let fit = fit(&CalibrationSet::default_glucose(), &range(2.0, 8.0)).unwrap();
        assert_eq!(fit.n_points, 4);
        assert_eq!(fit.range, range(2.0, 8.0));
    }

    #[test]
    fn two_points_give_an_exact_line() {
        let fit = fit(&set(&[(1.0, 0.2), (3.0, 0.6)]), &range(0.0, 5.0)).unwrap();
        assert_relative_eq!(fit.slope, 0.2, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 0.0, epsilon = 1e-12);
        assert_relative_eq!(fit.r_squared.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn single_point_in_range_is_insufficient() {
        let err = fit(&CalibrationSet::default_glucose(), &range(3.0, 5.0)).unwrap_err();
        assert_eq!(err, FitError::InsufficientData { points: 1, distinct: 1 });
    }

    #[test]
    fn repeated_concentration_is_insufficient() {
        let err = fit(&set(&[(2.0, 0.3), (2.0, 0.31), (2.0, 0.29)]), &range(0.0, 5.0)).unwrap_err();
        assert_eq!(err, FitError::InsufficientData { points: 3, distinct: 1 });
    }

    #[test]
    fn reversed_range_is_rejected() {
        let bad = FitRange { start: 8.0, end: 2.0 };
        let err = fit(&CalibrationSet::default_glucose(), &bad).unwrap_err();
        assert_eq!(err, FitError::InvalidRange { start: 8.0, end: 2.0 });
    }

    #[test]
    fn noisy_data_still_fits_with_advisory() {
        let fit = fit(
            &set(&[(0.0, 0.0), (1.0, 0.9), (2.0, 0.1), (3.0, 1.0)]),
            &range(0.0, 3.0),
        )
        .unwrap();
        assert_eq!(fit.quality(), FitQuality::Advisory);
        assert!(fit.is_invertible());
    }

    #[test]
    fn ols_is_a_local_minimum_on_default_data() {
        let data = CalibrationSet::default_glucose();
        let fit = fit(&data, &range(0.0, 10.0)).unwrap();
        let x: Vec<f64> = data.points.iter().map(|p| p.concentration).collect();
        let y: Vec<f64> = data.points.iter().map(|p| p.absorbance).collect();
        let best = sum_squared_residuals(&x, &y, fit.slope, fit.intercept);
        for d in [-1e-3, 1e-3] {
            assert!(sum_squared_residuals(&x, &y, fit.slope + d, fit.intercept) >= best);
            assert!(sum_squared_residuals(&x, &y, fit.slope, fit.intercept + d) >= best);
        }
    }
}

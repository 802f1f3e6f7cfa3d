//! Property tests for the fitter and the inverse estimator.

use proptest::prelude::*;

use std_curve::domain::{CalibrationPoint, CalibrationSet, Estimate, FitRange, LinearFit};
use std_curve::estimate::estimate;
use std_curve::fit::fit;
use std_curve::math::sum_squared_residuals;

/// Standards at distinct, increasing concentrations with noisy absorbances.
fn calibration_sets() -> impl Strategy<Value = CalibrationSet> {
    prop::collection::vec((0.1f64..2.0, -0.5f64..0.5), 2..12).prop_map(|steps| {
        let mut conc = 0.0;
        let points = steps
            .into_iter()
            .map(|(step, abs)| {
                conc += step;
                CalibrationPoint::new(conc, abs + 0.1 * conc)
            })
            .collect();
        CalibrationSet::new(points)
    })
}

fn line(slope: f64, intercept: f64) -> LinearFit {
    LinearFit {
        slope,
        intercept,
        r_squared: Some(1.0),
        n_points: 2,
        range: FitRange { start: 0.0, end: 100.0 },
    }
}

proptest! {
    #[test]
    fn fitted_line_minimizes_squared_residuals(
        set in calibration_sets(),
        d_slope in -0.5f64..0.5,
        d_intercept in -0.5f64..0.5,
    ) {
        let range = FitRange::full(&set).unwrap();
        let fitted = fit(&set, &range).unwrap();

        let x: Vec<f64> = set.points.iter().map(|p| p.concentration).collect();
        let y: Vec<f64> = set.points.iter().map(|p| p.absorbance).collect();
        let best = sum_squared_residuals(&x, &y, fitted.slope, fitted.intercept);
        let other = sum_squared_residuals(
            &x,
            &y,
            fitted.slope + d_slope,
            fitted.intercept + d_intercept,
        );
        prop_assert!(other >= best - 1e-9 * (1.0 + best));
    }

    #[test]
    fn fitting_is_deterministic(set in calibration_sets()) {
        let range = FitRange::full(&set).unwrap();
        prop_assert_eq!(fit(&set, &range), fit(&set, &range));
    }

    #[test]
    fn estimate_inverts_the_line(
        slope in 0.01f64..2.0,
        intercept in -0.5f64..0.5,
        conc in 0.0f64..100.0,
    ) {
        let fitted = line(slope, intercept);
        let absorbance = fitted.predict(conc);
        match estimate(Some(&fitted), Some(absorbance)) {
            Estimate::Value(v) => prop_assert!((v - conc).abs() <= 0.0005 + 1e-9),
            // Float error can push a near-zero concentration just below zero.
            Estimate::NegativeClamped => prop_assert!(conc < 0.0005),
            other => prop_assert!(false, "unexpected estimate {:?}", other),
        }
    }

    #[test]
    fn estimates_are_never_negative(
        slope in prop_oneof![-2.0f64..-0.01, 0.01f64..2.0],
        intercept in -1.0f64..1.0,
        absorbance in -2.0f64..2.0,
    ) {
        let fitted = line(slope, intercept);
        match estimate(Some(&fitted), Some(absorbance)) {
            Estimate::Value(v) => prop_assert!(v >= 0.0),
            Estimate::NegativeClamped => prop_assert!((absorbance - intercept) / slope < 0.0),
            other => prop_assert!(false, "unexpected estimate {:?}", other),
        }
    }
}

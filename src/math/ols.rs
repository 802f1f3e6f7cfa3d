//! Ordinary least squares for a single regressor.
//!
//! We solve the textbook two-parameter problem
//!
//! ```text
//! minimize Σ (y_i - (m x_i + b))^2
//! ```
//!
//! in closed form on mean-centred sums:
//!
//! - `m = Σ(x_i - x̄)(y_i - ȳ) / Σ(x_i - x̄)^2`
//! - `b = ȳ - m x̄`
//! - `r = Σ(x_i - x̄)(y_i - ȳ) / sqrt(Σ(x_i - x̄)^2 Σ(y_i - ȳ)^2)`
//!
//! Centring first keeps the sums well conditioned for the small tables this
//! tool sees (tens of rows at most).

/// Slope, intercept and squared correlation of a fitted line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStats {
    pub slope: f64,
    pub intercept: f64,
    /// `None` when `y` has no variation (correlation undefined).
    pub r_squared: Option<f64>,
}

/// Fit `y = slope * x + intercept`.
///
/// Returns `None` if fewer than two pairs are given or `x` has no spread
/// (the slope denominator would be zero).
pub fn simple_linear_regression(x: &[f64], y: &[f64]) -> Option<LineStats> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let x_mean = mean(x);
    let y_mean = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || !sxx.is_finite() {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let r_squared = if syy > 0.0 {
        let r = sxy / (sxx * syy).sqrt();
        Some((r * r).clamp(0.0, 1.0))
    } else {
        None
    };

    Some(LineStats {
        slope,
        intercept,
        r_squared,
    })
}

/// Sum of squared residuals of `y` against the line.
pub fn sum_squared_residuals(x: &[f64], y: &[f64], slope: f64, intercept: f64) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - (slope * xi + intercept);
            r * r
        })
        .sum()
}

pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Round half away from zero to 3 decimal places.
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

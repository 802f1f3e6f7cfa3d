//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - calibration points outside the fit range: `o`
//! - calibration points used by the fit: `*`
//! - fitted line over the fit range: `-`

use crate::domain::{CalibrationSet, FitRange, LinearFit};

/// Render the calibration scatter with the fitted line (when there is one).
pub fn render_ascii_plot(
    calibration: &CalibrationSet,
    range: &FitRange,
    fit: Option<&LinearFit>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (c_min, c_max) = calibration
        .concentration_domain()
        .filter(|(lo, hi)| hi > lo)
        .unwrap_or((0.0, 1.0));

    let line = fit.map(|f| sample_line(f, c_min, c_max, width));
    let (a_min, a_max) = absorbance_range(calibration, line.as_deref()).unwrap_or((0.0, 1.0));
    let (a_min, a_max) = pad_range(a_min, a_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first so points overlay it.
    if let Some(line) = &line {
        draw_polyline(&mut grid, line, c_min, c_max, a_min, a_max);
    }

    for p in &calibration.points {
        if !(p.concentration.is_finite() && p.absorbance.is_finite()) {
            continue;
        }
        let x = map_x(p.concentration, c_min, c_max, width);
        let y = map_y(p.absorbance, a_min, a_max, height);
        grid[y][x] = if range.contains(p.concentration) { '*' } else { 'o' };
    }

    let mut out = format!(
        "Plot: C=[{c_min:.3}, {c_max:.3}] mg/mL | A=[{a_min:.3}, {a_max:.3}] AU\n"
    );
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Sample the fitted line across its own range, clipped to the plotted domain.
fn sample_line(fit: &LinearFit, c_min: f64, c_max: f64, n: usize) -> Vec<(f64, f64)> {
    let lo = fit.range.start.max(c_min);
    let hi = fit.range.end.min(c_max);
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return Vec::new();
    }
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let c = lo + u * (hi - lo);
            (c, fit.predict(c))
        })
        .collect()
}

fn absorbance_range(calibration: &CalibrationSet, line: Option<&[(f64, f64)]>) -> Option<(f64, f64)> {
    let mut min_a = f64::INFINITY;
    let mut max_a = f64::NEG_INFINITY;

    for p in &calibration.points {
        if p.absorbance.is_finite() {
            min_a = min_a.min(p.absorbance);
            max_a = max_a.max(p.absorbance);
        }
    }
    for &(_, a) in line.unwrap_or_default() {
        min_a = min_a.min(a);
        max_a = max_a.max(a);
    }

    (min_a.is_finite() && max_a.is_finite() && max_a > min_a).then_some((min_a, max_a))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(c: f64, c_min: f64, c_max: f64, width: usize) -> usize {
    let u = ((c - c_min) / (c_max - c_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(a: f64, a_min: f64, a_max: f64, height: usize) -> usize {
    let u = ((a - a_min) / (a_max - a_min)).clamp(0.0, 1.0);
    // Row 0 is the top (highest absorbance).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], line: &[(f64, f64)], c_min: f64, c_max: f64, a_min: f64, a_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(c, a) in line {
        let x = map_x(c, c_min, c_max, width);
        let y = map_y(a, a_min, a_max, height);
        match prev {
            Some((x0, y0)) => draw_segment(grid, x0, y0, x, y, '-'),
            None => grid[y][x] = '-',
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham).
fn draw_segment(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
            .filter(|cell| **cell == ' ')
        {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CalibrationPoint;

    fn small_set() -> CalibrationSet {
        CalibrationSet::new(vec![
            CalibrationPoint::new(0.0, 0.0),
            CalibrationPoint::new(4.0, 0.4),
            CalibrationPoint::new(9.0, 0.9),
        ])
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let set = small_set();
        let range = FitRange { start: 0.0, end: 4.0 };
        let fit = LinearFit {
            slope: 0.1,
            intercept: 0.0,
            r_squared: Some(1.0),
            n_points: 2,
            range,
        };

        let txt = render_ascii_plot(&set, &range, Some(&fit), 10, 5);
        let expected = concat!(
            "Plot: C=[0.000, 9.000] mg/mL | A=[-0.045, 0.945] AU\n",
            "         o\n",
            "          \n",
            "    *     \n",
            " ---      \n",
            "*         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn without_fit_only_points_are_drawn() {
        let set = small_set();
        let range = FitRange { start: 5.0, end: 6.0 };
        let txt = render_ascii_plot(&set, &range, None, 10, 5);
        let body: String = txt.lines().skip(1).collect();
        assert_eq!(body.matches('o').count(), 3);
        assert!(!body.contains('*'));
        assert!(!body.contains('-'));
    }

    #[test]
    fn degenerate_table_still_renders() {
        let set = CalibrationSet::new(vec![CalibrationPoint::new(2.0, 0.3)]);
        let range = FitRange { start: 2.0, end: 2.0 };
        let txt = render_ascii_plot(&set, &range, None, 12, 6);
        assert_eq!(txt.lines().count(), 7);
        assert!(txt.contains('*'));
    }
}

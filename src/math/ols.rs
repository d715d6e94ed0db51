//! Ordinary least squares.
//!
//! The forecaster fits one straight line per forecast point:
//!
//! ```text
//! minimize Σ (y_i - (a + b x_i))^2
//! ```
//!
//! over a handful of yearly totals. We centre `x` before building the design
//! matrix (calendar years around 2000 make the raw normal equations badly
//! conditioned) and solve with SVD.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// A fitted line `y = intercept + slope * (x - x_center)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    pub x_center: f64,
}

impl LinearFit {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.intercept + self.slope * (x - self.x_center)
    }

    fn flat(level: f64, x_center: f64) -> Self {
        Self {
            intercept: level,
            slope: 0.0,
            x_center,
        }
    }
}

/// Fit a degree-1 polynomial to `(x, y)` points.
///
/// If every `x` is the same the slope is unidentified; we return the flat
/// line through the mean of `y` instead of failing. Identical `y` values
/// give an exactly flat line at that value. Returns `None` for fewer than
/// two points or non-finite input.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }
    if !xs.iter().chain(ys).all(|v| v.is_finite()) {
        return None;
    }

    let x_center = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;

    if ys.iter().all(|&y| y == ys[0]) {
        return Some(LinearFit::flat(ys[0], x_center));
    }

    let spread: f64 = xs.iter().map(|x| (x - x_center).powi(2)).sum();
    if spread < 1e-12 {
        return Some(LinearFit::flat(y_mean, x_center));
    }

    let design = DMatrix::from_fn(n, 2, |row, col| if col == 0 { 1.0 } else { xs[row] - x_center });
    let target = DVector::from_column_slice(ys);
    let beta = solve_least_squares(&design, &target)?;

    Some(LinearFit {
        intercept: beta[0],
        slope: beta[1],
        x_center,
    })
}

//! Least-squares polynomial smoothing.
//!
//! Fitting maps the observed x range onto `[-1, 1]` before building the
//! Vandermonde matrix. Without that shift a degree-10 fit on raw power levels
//! (0..100) would have columns spanning twenty orders of magnitude. Columns
//! are additionally normalised to unit length before the SVD solve, and the
//! scaling is undone on the way out.
//!
//! The stored coefficients therefore belong to the scaled variable
//! `u = (2x - (x_min + x_max)) / (x_max - x_min)`; `PolyCurve::eval` applies
//! the same mapping, so callers only ever deal with raw x values.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::{sample_fn, solve_least_squares};

/// A fitted polynomial over a fixed domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyCurve {
    pub degree: usize,
    /// Observed `[x_min, x_max]` at fit time.
    pub domain: [f64; 2],
    /// Ascending coefficients in the scaled variable.
    pub coefficients: Vec<f64>,
}

impl PolyCurve {
    /// Evaluate the polynomial at a raw x value.
    pub fn eval(&self, x: f64) -> f64 {
        let u = map_to_window(x, self.domain);
        self.coefficients.iter().rev().fold(0.0, |acc, &c| acc * u + c)
    }

    /// Evaluate on `n` evenly spaced points spanning the fit domain.
    pub fn sample(&self, n: usize) -> Vec<(f64, f64)> {
        sample_fn(self.domain[0], self.domain[1], n, |x| self.eval(x))
    }
}

/// Fit a least-squares polynomial of the given degree.
///
/// Fails when there are no points, the inputs are not finite, or every x is
/// identical (the domain cannot be mapped). Fewer distinct x values than
/// `degree + 1` is accepted: the minimum-norm solution interpolates them.
pub fn fit_polynomial(x: &[f64], y: &[f64], degree: usize) -> Result<PolyCurve, AppError> {
    if x.len() != y.len() {
        return Err(AppError::new(
            4,
            format!("Mismatched series lengths: {} x values, {} y values.", x.len(), y.len()),
        ));
    }
    if x.is_empty() {
        return Err(AppError::new(3, "No data points to fit."));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(AppError::new(4, "Non-finite value in fit input."));
    }

    let (lo, hi) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !(hi > lo) {
        return Err(AppError::new(
            4,
            format!("Cannot fit a polynomial: every x value equals {lo}."),
        ));
    }
    let domain = [lo, hi];

    let n = x.len();
    let p = degree + 1;
    let mut design = DMatrix::<f64>::zeros(n, p);
    for (i, &xi) in x.iter().enumerate() {
        let u = map_to_window(xi, domain);
        let mut pow = 1.0;
        for j in 0..p {
            design[(i, j)] = pow;
            pow *= u;
        }
    }

    let mut scale = vec![1.0; p];
    for j in 0..p {
        let norm = design.column(j).norm();
        if norm > 0.0 {
            scale[j] = norm;
            design.column_mut(j).unscale_mut(norm);
        }
    }

    let rhs = DVector::from_column_slice(y);
    let beta = solve_least_squares(&design, &rhs).ok_or_else(|| {
        AppError::new(4, format!("Least-squares solve failed for degree {degree}."))
    })?;

    let coefficients = beta.iter().zip(scale.iter()).map(|(b, s)| b / s).collect();

    Ok(PolyCurve {
        degree,
        domain,
        coefficients,
    })
}

/// Residual sum of squares of `curve` over the given points.
pub fn residual_sum_of_squares(curve: &PolyCurve, x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| {
            let r = yi - curve.eval(xi);
            r * r
        })
        .sum()
}

fn map_to_window(x: f64, domain: [f64; 2]) -> f64 {
    let [lo, hi] = domain;
    (2.0 * x - (lo + hi)) / (hi - lo)
}

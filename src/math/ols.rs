//! Least squares solver.
//!
//! Polynomial smoothing reduces to:
//!
//! ```text
//! minimize Σ (y_i - v_i^T β)^2
//! ```
//!
//! where `v_i` is a (column-normalised) Vandermonde row.
//!
//! Implementation choices:
//! - SVD handles tall systems (many bench rows) and wide/rank-deficient ones
//!   (fewer distinct x values than coefficients) alike; small singular values
//!   are truncated, which yields the minimum-norm least-squares solution.
//! - The truncation threshold is relative to the largest singular value, and
//!   is loosened step by step if the strict solve produces non-finite values.

use nalgebra::{DMatrix, DVector};

/// Relative truncation factors tried in order.
const REL_TOLERANCES: [f64; 3] = [1.0, 1e3, 1e6];

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is empty or too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.ncols() == 0 || x.nrows() != y.len() {
        return None;
    }

    let svd = x.clone().svd(true, true);
    let largest = svd.singular_values.max();
    if !(largest.is_finite() && largest > 0.0) {
        return None;
    }

    let base = largest * f64::EPSILON * x.nrows().max(x.ncols()) as f64;
    for &factor in &REL_TOLERANCES {
        if let Ok(beta) = svd.solve(y, base * factor) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_handles_wide_systems() {
        // One observation, two unknowns: minimum-norm solution of b0 + b1 = 2 is (1, 1).
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[2.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-10);
        assert!((beta[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_rejects_empty_system() {
        let x = DMatrix::<f64>::zeros(0, 2);
        let y = DVector::<f64>::zeros(0);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}

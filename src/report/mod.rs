//! Reporting utilities: residuals and formatted terminal output.

pub mod format;

use crate::math::PolyCurve;

/// Observed minus fitted value for each sample.
pub fn fit_residuals(curve: &PolyCurve, x: &[f64], y: &[f64]) -> Vec<f64> {
    x.iter().zip(y.iter()).map(|(&xi, &yi)| yi - curve.eval(xi)).collect()
}

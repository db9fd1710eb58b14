//! Polynomial smoothing of batch metric pairs.

use crate::domain::{Column, MeasurementTable, MetricPair, PairedSeries, RowPolicy, SmoothingConfig};
use crate::error::AppError;
use crate::math::{PolyCurve, fit_polynomial};
use crate::report::fit_residuals;

/// A smoothed metric pair.
#[derive(Debug, Clone)]
pub struct PairFit {
    pub pair: MetricPair,
    /// The rows actually used for fitting.
    pub points: PairedSeries,
    pub curve: PolyCurve,
    pub sse: f64,
    pub rmse: f64,
}

impl PairFit {
    /// The smoothed curve on `n` evenly spaced x values over the observed range.
    pub fn smooth_curve(&self, n: usize) -> Vec<(f64, f64)> {
        self.curve.sample(n)
    }
}

/// A pair that could not be fitted, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedPair {
    pub pair: MetricPair,
    pub reason: String,
}

/// Outcome of smoothing a whole chart catalogue.
#[derive(Debug, Clone, Default)]
pub struct BatchFits {
    pub fitted: Vec<PairFit>,
    pub skipped: Vec<SkippedPair>,
}

/// Fit one pair on the given samples.
pub fn fit_pair_series(
    pair: MetricPair,
    points: PairedSeries,
    degree: usize,
) -> Result<PairFit, AppError> {
    let curve = fit_polynomial(&points.x, &points.y, degree).map_err(|e| e.context(pair.title))?;

    let residuals = fit_residuals(&curve, &points.x, &points.y);
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let rmse = (sse / points.len() as f64).sqrt();

    log::debug!(
        "{}: n={} degree={} sse={sse:.6} rmse={rmse:.6}",
        pair.title,
        points.len(),
        degree
    );

    Ok(PairFit {
        pair,
        points,
        curve,
        sse,
        rmse,
    })
}

/// Columns a row must hold to take part in `pair` under `policy`.
pub fn required_columns(
    pair: &MetricPair,
    all_pairs: &[MetricPair],
    policy: RowPolicy,
) -> Vec<Column> {
    let mut cols = match policy {
        RowPolicy::PerPair => vec![pair.x, pair.y],
        RowPolicy::Shared => all_pairs.iter().flat_map(|p| [p.x, p.y]).collect(),
    };
    cols.sort_unstable();
    cols.dedup();
    cols
}

/// Fit every pair in the catalogue, skipping (not failing on) pairs that cannot be fitted.
pub fn fit_pairs(
    table: &MeasurementTable,
    pairs: &[MetricPair],
    policy: RowPolicy,
    smoothing: &SmoothingConfig,
) -> BatchFits {
    let mut out = BatchFits::default();

    for pair in pairs {
        let required = required_columns(pair, pairs, policy);
        let points = table.pair_where(pair.x, pair.y, &required);

        match fit_pair_series(*pair, points, smoothing.degree) {
            Ok(fit) => out.fitted.push(fit),
            Err(err) => {
                log::warn!("skipping '{}': {err}", pair.title);
                out.skipped.push(SkippedPair {
                    pair: *pair,
                    reason: err.message().to_string(),
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DEFAULT_PAIRS, Measurement};

    fn table() -> MeasurementTable {
        let rows = (0..30)
            .map(|i| {
                let p = 10.0 + 3.0 * i as f64;
                let mut m = Measurement::default();
                m.set(Column::PowerLevel, Some(p));
                m.set(Column::CurrentDensity, Some(5.0 * p));
                m.set(Column::VoltageCell, Some(1.4 + 0.002 * p));
                // Faraday efficiency missing on every third row.
                m.set(Column::FaradayEfficiency, if i % 3 == 0 { None } else { Some(0.95) });
                m
            })
            .collect();
        MeasurementTable::new(rows)
    }

    #[test]
    fn per_pair_policy_keeps_rows_independent() {
        let t = table();
        let pairs = [DEFAULT_PAIRS[0], DEFAULT_PAIRS[6]];
        let fits = fit_pairs(&t, &pairs, RowPolicy::PerPair, &SmoothingConfig::default());

        assert_eq!(fits.fitted.len(), 2);
        assert_eq!(fits.fitted[0].points.len(), 30);
        assert_eq!(fits.fitted[1].points.len(), 20);
    }

    #[test]
    fn shared_policy_uses_the_union_of_columns() {
        let t = table();
        let pairs = [DEFAULT_PAIRS[0], DEFAULT_PAIRS[6]];
        let fits = fit_pairs(&t, &pairs, RowPolicy::Shared, &SmoothingConfig::default());
        assert_eq!(fits.fitted[0].points.len(), 20);
    }

    #[test]
    fn unfittable_pairs_are_skipped() {
        let t = table();
        // Overall efficiency is never populated.
        let pairs = [DEFAULT_PAIRS[0], DEFAULT_PAIRS[10]];
        let fits = fit_pairs(&t, &pairs, RowPolicy::PerPair, &SmoothingConfig::default());
        assert_eq!(fits.fitted.len(), 1);
        assert_eq!(fits.skipped.len(), 1);
        assert_eq!(fits.skipped[0].pair.file_name, "Power_Level_vs_Overall_Efficiency.png");
    }

    #[test]
    fn smooth_curve_spans_observed_range() {
        let t = table();
        let fits = fit_pairs(
            &t,
            &DEFAULT_PAIRS[..1],
            RowPolicy::PerPair,
            &SmoothingConfig::default(),
        );
        let fit = &fits.fitted[0];
        let curve = fit.smooth_curve(200);
        assert_eq!(curve.len(), 200);
        assert_eq!(curve[0].0, 10.0);
        assert_eq!(curve[199].0, 97.0);
        assert!(fit.rmse < 1e-6);
    }
}

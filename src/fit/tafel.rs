//! Tafel analysis: overpotential against log10(current density).
//!
//! The kinetically controlled region is a fixed log10(j) window; a straight
//! line fitted there gives the Tafel slope (mV/decade) and, from its
//! intercept, the exchange current density.

use crate::domain::{Column, MeasurementTable, TafelConfig, TafelWindow, min_max};
use crate::math::{CubicSpline, LinearFit, linear_regression, linspace, prepare_knots};

/// Overpotential in mV for a cell voltage in V.
pub fn overpotential_mv(voltage_v: f64, standard_potential_v: f64) -> f64 {
    (voltage_v - standard_potential_v) * 1000.0
}

/// Log-transformed Tafel samples, in row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TafelSeries {
    pub log_j: Vec<f64>,
    pub eta_mv: Vec<f64>,
}

impl TafelSeries {
    pub fn len(&self) -> usize {
        self.log_j.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_j.is_empty()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.log_j.iter().copied().zip(self.eta_mv.iter().copied()).collect()
    }

    /// The samples whose log10(j) falls inside `window`.
    pub fn restrict(&self, window: TafelWindow) -> TafelSeries {
        let mut out = TafelSeries::default();
        for (&x, &y) in self.log_j.iter().zip(self.eta_mv.iter()) {
            if window.contains(x) {
                out.log_j.push(x);
                out.eta_mv.push(y);
            }
        }
        out
    }
}

/// Pair current densities with overpotentials, keeping only `j > 0`.
pub fn log_transform(current_density: &[f64], eta_mv: &[f64]) -> TafelSeries {
    let mut out = TafelSeries::default();
    for (&j, &eta) in current_density.iter().zip(eta_mv.iter()) {
        if j > 0.0 && j.is_finite() {
            out.log_j.push(j.log10());
            out.eta_mv.push(eta);
        }
    }
    out
}

/// Build the Tafel series from the rows holding both voltage cell and current density.
pub fn tafel_series(table: &MeasurementTable, standard_potential_v: f64) -> (TafelSeries, usize) {
    let paired = table.pair(Column::VoltageCell, Column::CurrentDensity);
    let eta: Vec<f64> = paired
        .x
        .iter()
        .map(|&v| overpotential_mv(v, standard_potential_v))
        .collect();
    (log_transform(&paired.y, &eta), paired.len())
}

/// The windowed straight-line fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TafelFit {
    pub line: LinearFit,
    pub window: TafelWindow,
    /// Exchange current density, in the unit of the current density column.
    pub j0: f64,
    /// Observed log10(j) range of the windowed points.
    pub x_range: (f64, f64),
}

impl TafelFit {
    /// Tafel slope in mV/decade.
    pub fn slope(&self) -> f64 {
        self.line.slope
    }

    pub fn intercept(&self) -> f64 {
        self.line.intercept
    }

    /// The fitted line on `n` evenly spaced points across the windowed range.
    pub fn line_points(&self, n: usize) -> Vec<(f64, f64)> {
        linspace(self.x_range.0, self.x_range.1, n)
            .into_iter()
            .map(|x| (x, self.line.predict(x)))
            .collect()
    }
}

/// Why the Tafel fit was not produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyWindow,
    Degenerate { points: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyWindow => {
                f.write_str("No data points in the selected linear region. Adjust the range.")
            }
            SkipReason::Degenerate { points } => write!(
                f,
                "The selected linear region holds {points} point(s) with fewer than two \
                 distinct log10(j) values; slope is undefined."
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TafelOutcome {
    Fitted(TafelFit),
    Skipped(SkipReason),
}

impl TafelOutcome {
    pub fn fit(&self) -> Option<&TafelFit> {
        match self {
            TafelOutcome::Fitted(fit) => Some(fit),
            TafelOutcome::Skipped(_) => None,
        }
    }
}

/// Fit the Tafel line inside `window`. An empty or degenerate window is not an error.
pub fn fit_tafel(series: &TafelSeries, window: TafelWindow) -> TafelOutcome {
    let windowed = series.restrict(window);
    if windowed.is_empty() {
        let reason = SkipReason::EmptyWindow;
        log::warn!("{reason}");
        return TafelOutcome::Skipped(reason);
    }

    let Some(line) = linear_regression(&windowed.log_j, &windowed.eta_mv) else {
        let reason = SkipReason::Degenerate { points: windowed.len() };
        log::warn!("{reason}");
        return TafelOutcome::Skipped(reason);
    };
    let Some(x_range) = min_max(&windowed.log_j) else {
        return TafelOutcome::Skipped(SkipReason::EmptyWindow);
    };

    let j0 = 10f64.powf(-line.intercept / line.slope);
    log::debug!(
        "tafel: n={} slope={:.3} intercept={:.3} r2={:.4} j0={j0:.4e}",
        line.n,
        line.slope,
        line.intercept,
        line.r_squared()
    );

    TafelOutcome::Fitted(TafelFit {
        line,
        window,
        j0,
        x_range,
    })
}

/// Everything the Tafel chart and report need.
#[derive(Debug, Clone)]
pub struct TafelAnalysis {
    pub series: TafelSeries,
    /// Spline through the samples on the smoothing grid; empty for fewer than two distinct x.
    pub interpolated: Vec<(f64, f64)>,
    pub outcome: TafelOutcome,
    /// Rows holding both voltage cell and current density.
    pub rows_used: usize,
}

/// Spline through the Tafel samples, sampled on `n` evenly spaced points.
pub fn interpolate_series(series: &TafelSeries, n: usize) -> Vec<(f64, f64)> {
    let (xs, ys) = prepare_knots(&series.log_j, &series.eta_mv);
    let Some(spline) = CubicSpline::new(xs, ys) else {
        return Vec::new();
    };
    let (lo, hi) = spline.x_range();
    linspace(lo, hi, n).into_iter().map(|x| (x, spline.eval(x))).collect()
}

pub fn analyze(table: &MeasurementTable, cfg: &TafelConfig) -> TafelAnalysis {
    let (series, rows_used) = tafel_series(table, cfg.standard_potential_v);
    let interpolated = interpolate_series(&series, cfg.grid_points);
    let outcome = fit_tafel(&series, cfg.window);

    log::info!(
        "tafel: {} rows, {} with positive current density, window [{}, {})",
        rows_used,
        series.len(),
        cfg.window.lo,
        cfg.window.hi
    );

    TafelAnalysis {
        series,
        interpolated,
        outcome,
        rows_used,
    }
}

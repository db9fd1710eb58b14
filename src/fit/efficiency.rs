//! Efficiency curves behind the slider figure.
//!
//! All four metrics are fitted against power level on the same row set: rows
//! complete in power level and all four efficiencies.

use crate::domain::{
    Column, EFFICIENCY_METRICS, EfficiencyMetric, MeasurementTable, SmoothingConfig, min_max,
};
use crate::error::AppError;
use crate::math::{PolyCurve, fit_polynomial};

/// One fitted efficiency metric.
#[derive(Debug, Clone)]
pub struct MetricCurve {
    pub metric: EfficiencyMetric,
    pub values: Vec<f64>,
    pub curve: PolyCurve,
}

/// The value of one metric's curve at a power level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub metric: EfficiencyMetric,
    pub power_level: f64,
    pub value: f64,
}

impl Reading {
    /// Annotation text drawn next to the marker.
    pub fn label(&self) -> String {
        format!("  {}: {:.2}", self.metric.short_label, self.value)
    }
}

/// Read-only fit set for the slider; evaluation never refits.
#[derive(Debug, Clone)]
pub struct EfficiencyFits {
    pub power_level: Vec<f64>,
    pub metrics: Vec<MetricCurve>,
    pub power_range: (f64, f64),
}

impl EfficiencyFits {
    /// Evaluate every metric curve at `power_level`.
    pub fn readings_at(&self, power_level: f64) -> Vec<Reading> {
        self.metrics
            .iter()
            .map(|m| Reading {
                metric: m.metric,
                power_level,
                value: m.curve.eval(power_level),
            })
            .collect()
    }

    pub fn rows_used(&self) -> usize {
        self.power_level.len()
    }
}

/// Columns a row needs to take part in the efficiency figure.
pub fn efficiency_columns() -> Vec<Column> {
    let mut cols = vec![Column::PowerLevel];
    cols.extend(EFFICIENCY_METRICS.iter().map(|m| m.column));
    cols
}

/// Fit the four efficiency curves.
pub fn fit_efficiency_curves(
    table: &MeasurementTable,
    smoothing: &SmoothingConfig,
) -> Result<EfficiencyFits, AppError> {
    let required = efficiency_columns();
    let rows: Vec<_> = table.complete_rows(&required).collect();
    if rows.is_empty() {
        return Err(AppError::new(
            3,
            "No rows with power level and all four efficiencies.",
        ));
    }

    let power_level: Vec<f64> = rows.iter().filter_map(|r| r.get(Column::PowerLevel)).collect();
    let power_range = min_max(&power_level)
        .ok_or_else(|| AppError::new(3, "No finite power levels available."))?;

    let mut metrics = Vec::with_capacity(EFFICIENCY_METRICS.len());
    for metric in EFFICIENCY_METRICS {
        let values: Vec<f64> = rows.iter().filter_map(|r| r.get(metric.column)).collect();
        let curve = fit_polynomial(&power_level, &values, smoothing.degree)
            .map_err(|e| e.context(metric.legend))?;
        metrics.push(MetricCurve { metric, values, curve });
    }

    log::info!(
        "fitted {} efficiency curves on {} rows (power {:.1}..{:.1}%)",
        metrics.len(),
        power_level.len(),
        power_range.0,
        power_range.1
    );

    Ok(EfficiencyFits {
        power_level,
        metrics,
        power_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Measurement;

    fn table() -> MeasurementTable {
        let rows = (0..12)
            .map(|i| {
                let p = 10.0 + 8.0 * i as f64;
                let mut m = Measurement::default();
                m.set(Column::PowerLevel, Some(p));
                m.set(Column::VoltageEfficiency, Some(0.9 - 0.002 * p));
                m.set(Column::FaradayEfficiency, Some(0.97));
                m.set(Column::CellEfficiency, Some(0.85 - 0.002 * p));
                m.set(Column::OverallEfficiency, if i == 5 { None } else { Some(0.8 - 0.002 * p) });
                m
            })
            .collect();
        MeasurementTable::new(rows)
    }

    #[test]
    fn rows_must_hold_all_metrics() {
        let fits = fit_efficiency_curves(&table(), &SmoothingConfig::default()).unwrap();
        assert_eq!(fits.rows_used(), 11);
        assert_eq!(fits.metrics.len(), 4);
        assert_eq!(fits.power_range, (10.0, 98.0));
    }

    #[test]
    fn readings_evaluate_stored_curves() {
        let fits = fit_efficiency_curves(&table(), &SmoothingConfig::default()).unwrap();
        let readings = fits.readings_at(50.0);
        assert_eq!(readings.len(), 4);
        assert!((readings[0].value - 0.8).abs() < 1e-6);
        assert!((readings[1].value - 0.97).abs() < 1e-6);
        assert_eq!(readings[0].label(), "  Voltage: 0.80");
        assert_eq!(readings[3].label(), "  Overall: 0.70");
    }

    #[test]
    fn empty_table_is_an_error() {
        let err = fit_efficiency_curves(&MeasurementTable::default(), &SmoothingConfig::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}

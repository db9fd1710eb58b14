//! Formatted terminal output for the three pipelines.
//!
//! Formatting lives here so the fitting code stays free of presentation and
//! output changes stay local.

use std::path::Path;

use crate::domain::Column;
use crate::fit::{BatchFits, Reading, TafelAnalysis, TafelOutcome};
use crate::io::ingest::IngestedData;

/// One line per loaded sheet: where it came from and how much was usable.
pub fn format_ingest_summary(ingest: &IngestedData) -> String {
    let mut out = String::new();
    out.push_str(&format!("Source: {}\n", ingest.source.display()));
    out.push_str(&format!(
        "Rows: {} read | {} unparseable cell(s) treated as missing\n",
        ingest.rows_read, ingest.coerced_cells
    ));

    let units: Vec<String> = Column::ALL
        .iter()
        .zip(&ingest.units)
        .filter(|(_, unit)| !unit.is_empty())
        .map(|(col, unit)| format!("{} [{unit}]", col.name()))
        .collect();
    if !units.is_empty() {
        out.push_str(&format!("Units: {}\n", units.join(", ")));
    }
    out
}

/// Diagnostics table of the batch run, plus skipped charts.
pub fn format_batch_summary(fits: &BatchFits, degree: usize, out_dir: &Path) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Smoothed metric charts (degree {degree}) ===\n"));
    out.push_str(&format!("Output directory: {}\n\n", out_dir.display()));

    out.push_str(format!("{:<44} {:>5} {:>12} {:>12}", "chart", "n", "sse", "rmse").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<44} {:-<5} {:-<12} {:-<12}", "", "", "", "").trim_end());
    out.push('\n');

    for fit in &fits.fitted {
        out.push_str(
            format!(
                "{:<44} {:>5} {:>12.6} {:>12.6}",
                truncate(fit.pair.title, 44),
                fit.points.len(),
                fit.sse,
                fit.rmse
            )
            .trim_end(),
        );
        out.push('\n');
    }

    for skipped in &fits.skipped {
        out.push_str(&format!("  (skipped {}) {}\n", skipped.pair.title, skipped.reason));
    }

    out
}

/// The Tafel report lines, including the warning when the fit was skipped.
pub fn format_tafel_report(analysis: &TafelAnalysis) -> String {
    let mut out = String::new();
    let unit = Column::CurrentDensity.unit();

    out.push_str("=== Tafel analysis ===\n");
    out.push_str(&format!(
        "Points: {} row(s) | {} with positive current density\n",
        analysis.rows_used,
        analysis.series.len()
    ));

    match &analysis.outcome {
        TafelOutcome::Fitted(fit) => {
            out.push_str(&format!(
                "Linear region: log10(j) in [{}, {}) | n={}\n",
                fit.window.lo, fit.window.hi, fit.line.n
            ));
            out.push_str(&format!("Tafel Slope: {:.3} mV/decade\n", fit.slope()));
            out.push_str(&format!("Exchange Current Density (j0): {:.2} {unit}\n", fit.j0));
            out.push_str(&format!(
                "Intercept: {:.3} mV | R^2: {:.4}\n",
                fit.intercept(),
                fit.line.r_squared()
            ));
        }
        TafelOutcome::Skipped(reason) => {
            out.push_str(&format!("Warning: {reason}\n"));
        }
    }

    out
}

/// Annotated values at the committed power level.
pub fn format_readings(readings: &[Reading]) -> String {
    let mut out = String::new();
    if let Some(first) = readings.first() {
        out.push_str(&format!("Power level: {:.1}%\n", first.power_level));
    }
    for r in readings {
        out.push_str(&format!("{:<20} {:.4}\n", r.metric.legend, r.value));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EFFICIENCY_METRICS, TafelWindow};
    use crate::fit::{SkipReason, TafelSeries, fit_tafel, log_transform};
    use crate::io::ingest::{RawCell, RawSheet, clean_sheet};

    fn analysis(series: TafelSeries, outcome: TafelOutcome) -> TafelAnalysis {
        TafelAnalysis {
            rows_used: series.len(),
            series,
            interpolated: Vec::new(),
            outcome,
        }
    }

    #[test]
    fn ingest_summary_lists_sheet_units() {
        let header = Column::ALL.iter().map(|c| c.name().to_string()).collect();
        let mut units: Vec<RawCell> = vec![RawCell::Empty; Column::ALL.len()];
        units[Column::PowerLevel.index()] = RawCell::Text("%".into());
        units[Column::CurrentDensity.index()] = RawCell::Text("mA/cm²".into());
        let data = vec![RawCell::Number(1.0), RawCell::Text("bad".into())];
        let ingest = clean_sheet(RawSheet { header, rows: vec![units, data] }).unwrap();

        let text = format_ingest_summary(&ingest);
        assert!(text.contains("Rows: 1 read | 1 unparseable cell(s) treated as missing\n"));
        assert!(text.ends_with("Units: Power_Level [%], Current_Density [mA/cm²]\n"));
    }

    #[test]
    fn tafel_report_prints_slope_and_j0() {
        let j = [10.0, 100.0, 1000.0];
        let eta: Vec<f64> = j.iter().map(|v: &f64| 70.0 * v.log10() - 100.0).collect();
        let series = log_transform(&j, &eta);
        let outcome = fit_tafel(&series, TafelWindow { lo: 0.5, hi: 3.5 });

        let text = format_tafel_report(&analysis(series, outcome));
        assert!(text.contains("Tafel Slope: 70.000 mV/decade\n"));
        assert!(text.contains("Exchange Current Density (j0): 26.83 mA/cm²\n"));
    }

    #[test]
    fn tafel_report_warns_on_empty_window() {
        let text = format_tafel_report(&analysis(
            TafelSeries::default(),
            TafelOutcome::Skipped(SkipReason::EmptyWindow),
        ));
        assert!(text.contains(
            "Warning: No data points in the selected linear region. Adjust the range.\n"
        ));
        assert!(!text.contains("Tafel Slope"));
    }

    #[test]
    fn readings_list_every_metric() {
        let readings: Vec<Reading> = EFFICIENCY_METRICS
            .iter()
            .map(|m| Reading {
                metric: *m,
                power_level: 42.0,
                value: 0.5,
            })
            .collect();
        let text = format_readings(&readings);
        assert!(text.starts_with("Power level: 42.0%\n"));
        assert!(text.contains("Overall Efficiency   0.5000\n"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}

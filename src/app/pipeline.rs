//! Shared pipeline logic used by the CLI handlers and the slider UI.
//!
//! Each pipeline is a straight line:
//! load sheet -> clean -> fit -> render
//!
//! The handlers in `app` only deal with presentation (printing, previews).

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{BatchConfig, EfficiencyConfig, TafelConfig};
use crate::error::AppError;
use crate::fit::{
    BatchFits, EfficiencyFits, Reading, TafelAnalysis, analyze, fit_efficiency_curves, fit_pairs,
};
use crate::io::curve::{build_curve_file, write_curves_json};
use crate::io::ingest::{IngestedData, load_measurements};
use crate::plot::{pair_output_path, render_efficiency_chart, render_pair_chart, render_tafel_chart};
use crate::tui::PowerSlider;

/// Outputs of `elx plot`.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub ingest: IngestedData,
    pub fits: BatchFits,
    /// PNG files written, in chart order.
    pub written: Vec<PathBuf>,
}

/// Outputs of `elx efficiency`.
#[derive(Debug, Clone)]
pub struct EfficiencyRun {
    pub ingest: IngestedData,
    pub fits: EfficiencyFits,
    pub readings: Vec<Reading>,
    pub written: PathBuf,
}

/// Outputs of `elx tafel`.
#[derive(Debug, Clone)]
pub struct TafelRun {
    pub ingest: IngestedData,
    pub analysis: TafelAnalysis,
    pub written: PathBuf,
}

pub fn load(path: &Path) -> Result<IngestedData, AppError> {
    load_measurements(path)
}

/// Smooth every configured pair and write one PNG per fitted pair.
pub fn run_batch(config: &BatchConfig) -> Result<BatchRun, AppError> {
    let ingest = load(&config.input)?;
    let fits = fit_pairs(&ingest.table, &config.pairs, config.row_policy, &config.smoothing);
    if fits.fitted.is_empty() {
        return Err(AppError::new(3, "No metric pair had usable rows to fit."));
    }

    fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create output directory '{}': {e}", config.out_dir.display()),
        )
    })?;

    let mut written = Vec::with_capacity(fits.fitted.len());
    for fit in &fits.fitted {
        let path = pair_output_path(&config.out_dir, &fit.pair);
        render_pair_chart(&path, fit, config.smoothing.grid_points, config.image_size)?;
        written.push(path);
    }

    if let Some(path) = &config.export_curves {
        let doc = build_curve_file(
            &ingest.source,
            &fits.fitted,
            config.smoothing.degree,
            config.smoothing.grid_points,
        );
        write_curves_json(path, &doc)?;
    }

    Ok(BatchRun { ingest, fits, written })
}

/// Load the sheet and fit the four efficiency curves.
pub fn fit_efficiency(
    config: &EfficiencyConfig,
) -> Result<(IngestedData, EfficiencyFits), AppError> {
    let ingest = load(&config.input)?;
    let fits = fit_efficiency_curves(&ingest.table, &config.smoothing)?;
    Ok((ingest, fits))
}

/// The power level a static figure is annotated at: clamped and snapped like a slider commit.
pub fn snapshot_power_level(fits: &EfficiencyFits, at: Option<f64>, step: f64) -> f64 {
    let mut slider = PowerSlider::new(fits.power_range.0, fits.power_range.1, step);
    if let Some(at) = at {
        slider.set_pending(at);
    }
    slider.commit()
}

/// Render the efficiency figure at one power level.
pub fn run_efficiency_snapshot(config: &EfficiencyConfig) -> Result<EfficiencyRun, AppError> {
    let (ingest, fits) = fit_efficiency(config)?;
    let power = snapshot_power_level(&fits, config.at, config.step);
    let readings = fits.readings_at(power);

    render_efficiency_chart(
        &config.out_file,
        &fits,
        &readings,
        config.smoothing.grid_points,
        config.image_size,
    )?;

    Ok(EfficiencyRun {
        ingest,
        fits,
        readings,
        written: config.out_file.clone(),
    })
}

/// Tafel analysis plus chart. A skipped fit still renders the chart.
pub fn run_tafel(config: &TafelConfig) -> Result<TafelRun, AppError> {
    let ingest = load(&config.input)?;
    let analysis = analyze(&ingest.table, config);
    render_tafel_chart(&config.out_file, &analysis, config.line_points, config.image_size)?;

    Ok(TafelRun {
        ingest,
        analysis,
        written: config.out_file.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, Measurement, MeasurementTable, SmoothingConfig};

    fn fits() -> EfficiencyFits {
        let rows = (0..15)
            .map(|i| {
                let p = 12.0 + 5.0 * i as f64;
                let mut m = Measurement::default();
                m.set(Column::PowerLevel, Some(p));
                m.set(Column::VoltageEfficiency, Some(0.8));
                m.set(Column::FaradayEfficiency, Some(0.9));
                m.set(Column::CellEfficiency, Some(0.72));
                m.set(Column::OverallEfficiency, Some(0.65));
                m
            })
            .collect();
        fit_efficiency_curves(&MeasurementTable::new(rows), &SmoothingConfig::default()).unwrap()
    }

    #[test]
    fn snapshot_defaults_to_lowest_power_level() {
        assert_eq!(snapshot_power_level(&fits(), None, 0.1), 12.0);
    }

    #[test]
    fn snapshot_clamps_and_snaps() {
        let f = fits();
        assert_eq!(snapshot_power_level(&f, Some(500.0), 0.1), 82.0);
        assert!((snapshot_power_level(&f, Some(33.333), 0.1) - 33.3).abs() < 1e-9);
    }

    #[test]
    fn missing_input_is_an_input_error() {
        let err = load(Path::new("definitely-missing-bench.xlsx")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

//! Read/write curve JSON files.
//!
//! Curve JSON is the portable representation of a batch run:
//! - per pair: columns, labels, fit diagnostics and polynomial coefficients
//! - run metadata (source sheet, degree, timestamp)
//! - a precomputed grid per curve for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurveFile, CurveGrid, CurveRecord};
use crate::error::AppError;
use crate::fit::PairFit;

/// Assemble the export document for a set of fitted pairs.
pub fn build_curve_file(
    source: &Path,
    fits: &[PairFit],
    degree: usize,
    grid_points: usize,
) -> CurveFile {
    let curves = fits
        .iter()
        .map(|fit| {
            let (x, y) = fit.smooth_curve(grid_points).into_iter().unzip();
            CurveRecord {
                title: fit.pair.title.to_string(),
                x: fit.pair.x,
                y: fit.pair.y,
                x_label: fit.pair.x_label.to_string(),
                y_label: fit.pair.y_label.to_string(),
                n_points: fit.points.len(),
                sse: fit.sse,
                rmse: fit.rmse,
                curve: fit.curve.clone(),
                grid: CurveGrid { x, y },
            }
        })
        .collect();

    CurveFile {
        tool: "elx".to_string(),
        generated_at: Utc::now(),
        source: source.display().to_string(),
        degree,
        grid_points,
        curves,
    }
}

/// Write a curve JSON file.
pub fn write_curves_json(path: &Path, curves: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(4, format!("Failed to create curve JSON '{}': {e}", path.display()))
    })?;

    serde_json::to_writer_pretty(file, curves)
        .map_err(|e| AppError::new(4, format!("Failed to write curve JSON: {e}")))?;

    log::info!("wrote {} curve(s) to {}", curves.curves.len(), path.display());
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curves_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display()))
    })?;
    let curves: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    Ok(curves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, DEFAULT_PAIRS, PairedSeries};
    use crate::fit::fit_pair_series;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("elx-{}-{name}", std::process::id()))
    }

    #[test]
    fn curve_file_survives_a_write_and_read() {
        let x: Vec<f64> = (0..20).map(|i| 10.0 + 4.0 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|p| 2.0 * p + 1.0).collect();
        let fit = fit_pair_series(DEFAULT_PAIRS[0], PairedSeries { x, y }, 10).unwrap();

        let doc = build_curve_file(Path::new("Book1.xlsx"), &[fit], 10, 50);
        assert_eq!(doc.curves[0].grid.x.len(), 50);
        assert_eq!(doc.curves[0].y, Column::CurrentDensity);

        let path = temp_path("curves.json");
        write_curves_json(&path, &doc).unwrap();
        let back = read_curves_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back.tool, "elx");
        assert_eq!(back.curves.len(), 1);
        assert_eq!(back.curves[0].title, "Power Level vs Current Density");
        assert!((back.curves[0].curve.eval(50.0) - 101.0).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_curves_json(&temp_path("does-not-exist.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

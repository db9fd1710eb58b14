//! PNG charts rendered with the Plotters bitmap backend.
//!
//! Every chart is drawn by a function generic over the drawing backend; the
//! `render_*` entry points only open the bitmap file and map errors. Bounds,
//! legend text and annotation text are computed by plain functions so they can
//! be tested without rasterising fonts.

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{Column, MetricPair, SeriesColor};
use crate::error::AppError;
use crate::fit::{EfficiencyFits, PairFit, Reading, TafelAnalysis, TafelFit};

type DrawResult = Result<(), Box<dyn Error>>;

pub const EFFICIENCY_TITLE: &str = "Smoothed Efficiency Metrics vs Power Level (%)";
pub const TAFEL_TITLE: &str = "Tafel Plot with Interpolated Blue Data and Linear Fit";

/// Axis ranges of a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

/// Bounds covering every series, padded by `pad_frac` of each span.
///
/// A zero span is widened so the axis stays drawable.
pub fn chart_bounds(series: &[&[(f64, f64)]], pad_frac: f64) -> Option<ChartBounds> {
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    for &(px, py) in series.iter().flat_map(|s| s.iter()) {
        if !(px.is_finite() && py.is_finite()) {
            continue;
        }
        x = [x[0].min(px), x[1].max(px)];
        y = [y[0].min(py), y[1].max(py)];
    }
    if !x[0].is_finite() || !y[0].is_finite() {
        return None;
    }
    Some(ChartBounds {
        x: pad(x, pad_frac),
        y: pad(y, pad_frac),
    })
}

fn pad(range: [f64; 2], frac: f64) -> [f64; 2] {
    let span = range[1] - range[0];
    let p = if span > 0.0 {
        span * frac
    } else {
        (range[0].abs() * frac).max(0.5)
    };
    [range[0] - p, range[1] + p]
}

/// Output file of a batch chart.
pub fn pair_output_path(out_dir: &Path, pair: &MetricPair) -> PathBuf {
    out_dir.join(pair.file_name)
}

pub fn tafel_legend(fit: &TafelFit) -> String {
    format!("Linear Fit (Tafel Slope = {:.3} mV/decade)", fit.slope())
}

/// Text block printed in the upper-left corner of the Tafel chart.
pub fn tafel_annotation(fit: &TafelFit) -> Vec<String> {
    let unit = Column::CurrentDensity.unit();
    let j0 = format!("{:.2}", fit.j0);
    vec![
        "Slope Equation:".to_string(),
        format!("Overpotential η = ({:.3}) · log(j) + ({:.3})", fit.slope(), fit.intercept()),
        format!("Exchange Current Density (j0) = {j0} {unit}"),
        format!("Tafel Equation: η = {:.3} · log(j / {j0})", fit.slope()),
    ]
}

fn color(c: SeriesColor) -> RGBColor {
    let (r, g, b) = c.rgb();
    RGBColor(r, g, b)
}

fn open_png(path: &Path, size: (u32, u32)) -> DrawingArea<BitMapBackend<'_>, Shift> {
    BitMapBackend::new(path, size).into_drawing_area()
}

fn render_error(path: &Path, err: Box<dyn Error>) -> AppError {
    AppError::new(4, format!("Failed to render {}: {err}", path.display()))
}

/// One batch chart: raw scatter plus the smoothed curve.
pub fn render_pair_chart(
    path: &Path,
    fit: &PairFit,
    grid_points: usize,
    size: (u32, u32),
) -> Result<(), AppError> {
    let root = open_png(path, size);
    draw_pair_chart(&root, fit, grid_points)
        .and_then(|_| root.present().map_err(Into::into))
        .map_err(|e| render_error(path, e))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

pub fn draw_pair_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    fit: &PairFit,
    grid_points: usize,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let points = fit.points.points();
    let curve = fit.smooth_curve(grid_points);
    let bounds = chart_bounds(&[points.as_slice(), curve.as_slice()], 0.05)
        .ok_or("no finite points to draw")?;
    let c = color(fit.pair.color);

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(root)
        .caption(fit.pair.title, ("sans-serif", 20))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(bounds.x[0]..bounds.x[1], bounds.y[0]..bounds.y[1])?;

    chart
        .configure_mesh()
        .x_desc(fit.pair.x_label)
        .y_desc(fit.pair.y_label)
        .draw()?;

    chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, c.filled())))?;
    chart
        .draw_series(LineSeries::new(curve, c.stroke_width(2)))?
        .label(fit.pair.series_label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// The efficiency figure with markers and labels at the readings' power level.
pub fn render_efficiency_chart(
    path: &Path,
    fits: &EfficiencyFits,
    readings: &[Reading],
    grid_points: usize,
    size: (u32, u32),
) -> Result<(), AppError> {
    let root = open_png(path, size);
    draw_efficiency_chart(&root, fits, readings, grid_points)
        .and_then(|_| root.present().map_err(Into::into))
        .map_err(|e| render_error(path, e))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Scatter and curve points of each efficiency metric, in drawing order.
pub fn efficiency_series(
    fits: &EfficiencyFits,
    grid_points: usize,
) -> Vec<(Vec<(f64, f64)>, Vec<(f64, f64)>)> {
    fits.metrics
        .iter()
        .map(|m| {
            let points = fits.power_level.iter().copied().zip(m.values.iter().copied()).collect();
            (points, m.curve.sample(grid_points))
        })
        .collect()
}

pub fn draw_efficiency_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    fits: &EfficiencyFits,
    readings: &[Reading],
    grid_points: usize,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let series = efficiency_series(fits, grid_points);
    let mut all: Vec<&[(f64, f64)]> = Vec::new();
    for (points, curve) in &series {
        all.push(points.as_slice());
        all.push(curve.as_slice());
    }
    let bounds = chart_bounds(&all, 0.05).ok_or("no finite points to draw")?;

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(root)
        .caption(EFFICIENCY_TITLE, ("sans-serif", 22))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(bounds.x[0]..bounds.x[1], bounds.y[0]..bounds.y[1])?;

    chart
        .configure_mesh()
        .x_desc("Power Level (%)")
        .y_desc("Efficiency")
        .draw()?;

    for (metric, (points, curve)) in fits.metrics.iter().zip(series) {
        let c = color(metric.metric.color);
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 3, c.mix(0.7).filled())))?;
        chart
            .draw_series(LineSeries::new(curve, c.stroke_width(2)))?
            .label(metric.metric.legend)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
    }

    for r in readings {
        let c = color(r.metric.color);
        let at = (r.power_level, r.value);
        chart.draw_series(std::iter::once(Circle::new(at, 5, c.filled())))?;
        chart.draw_series(std::iter::once(Text::new(
            r.label(),
            at,
            ("sans-serif", 14).into_font().color(&c),
        )))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// The Tafel chart; without a fit only the scatter and the interpolated curve are drawn.
pub fn render_tafel_chart(
    path: &Path,
    analysis: &TafelAnalysis,
    line_points: usize,
    size: (u32, u32),
) -> Result<(), AppError> {
    let root = open_png(path, size);
    draw_tafel_chart(&root, analysis, line_points)
        .and_then(|_| root.present().map_err(Into::into))
        .map_err(|e| render_error(path, e))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

pub fn draw_tafel_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    analysis: &TafelAnalysis,
    line_points: usize,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let points = analysis.series.points();
    let fit = analysis.outcome.fit();
    let line = fit.map(|f| f.line_points(line_points)).unwrap_or_default();
    let layers = [points.as_slice(), analysis.interpolated.as_slice(), line.as_slice()];
    let bounds = chart_bounds(&layers, 0.05).unwrap_or(ChartBounds {
        x: [0.0, 1.0],
        y: [0.0, 1.0],
    });

    let blue = color(SeriesColor::Blue);
    let red = color(SeriesColor::Red);

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(root)
        .caption(TAFEL_TITLE, ("sans-serif", 20))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(bounds.x[0]..bounds.x[1], bounds.y[0]..bounds.y[1])?;

    chart
        .configure_mesh()
        .x_desc(format!("log(Current Density) [log({})]", Column::CurrentDensity.unit()))
        .y_desc("Overpotential η (mV)")
        .draw()?;

    chart.draw_series(points.iter().map(|&p| Circle::new(p, 2, blue.filled())))?;
    if !analysis.interpolated.is_empty() {
        chart
            .draw_series(LineSeries::new(analysis.interpolated.iter().copied(), blue))?
            .label("Interpolated Data")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], blue));
    }

    if let Some(fit) = fit {
        chart
            .draw_series(LineSeries::new(line, red.stroke_width(2)))?
            .label(tafel_legend(fit))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], red.stroke_width(2)));

        let style = TextStyle::from(("sans-serif", 15).into_font()).color(&BLACK);
        let (w, h) = root.dim_in_pixel();
        let left = (w as f64 * 0.12) as i32;
        let top = (h as f64 * 0.12) as i32;
        for (i, text) in tafel_annotation(fit).iter().enumerate() {
            root.draw_text(text, &style, (left, top + 20 * i as i32))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::Coordinate(left - 60, top + 85))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    } else if !analysis.interpolated.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DEFAULT_PAIRS, TafelWindow};
    use crate::fit::{TafelOutcome, fit_tafel, log_transform};

    #[test]
    fn bounds_pad_each_axis() {
        let a = [(0.0, 10.0), (10.0, 20.0)];
        let b = [(5.0, 30.0)];
        let bounds = chart_bounds(&[&a[..], &b[..]], 0.05).unwrap();
        assert!((bounds.x[0] + 0.5).abs() < 1e-12);
        assert!((bounds.x[1] - 10.5).abs() < 1e-12);
        assert!((bounds.y[0] - 9.0).abs() < 1e-12);
        assert!((bounds.y[1] - 31.0).abs() < 1e-12);
    }

    #[test]
    fn bounds_widen_flat_series() {
        let a = [(1.0, 0.95), (2.0, 0.95)];
        let bounds = chart_bounds(&[&a[..]], 0.05).unwrap();
        assert!(bounds.y[1] > bounds.y[0]);
        let empty: [(f64, f64); 0] = [];
        assert!(chart_bounds(&[&empty[..]], 0.05).is_none());
    }

    #[test]
    fn batch_paths_are_fixed_per_pair() {
        let dir = Path::new("out");
        let first: Vec<PathBuf> = DEFAULT_PAIRS.iter().map(|p| pair_output_path(dir, p)).collect();
        let second: Vec<PathBuf> = DEFAULT_PAIRS.iter().map(|p| pair_output_path(dir, p)).collect();
        assert_eq!(first, second);
        assert_eq!(first[0], Path::new("out/Power_Level_vs_Current_Density.png"));
    }

    #[test]
    fn tafel_text_matches_fit() {
        let j = [10.0, 100.0, 1000.0];
        let eta: Vec<f64> = j.iter().map(|v: &f64| 70.0 * v.log10() - 100.0).collect();
        let window = TafelWindow { lo: 0.5, hi: 3.5 };
        let TafelOutcome::Fitted(fit) = fit_tafel(&log_transform(&j, &eta), window) else {
            panic!("expected a fit");
        };

        assert_eq!(tafel_legend(&fit), "Linear Fit (Tafel Slope = 70.000 mV/decade)");
        let lines = tafel_annotation(&fit);
        assert_eq!(lines[0], "Slope Equation:");
        assert_eq!(lines[1], "Overpotential η = (70.000) · log(j) + (-100.000)");
        assert_eq!(lines[2], "Exchange Current Density (j0) = 26.83 mA/cm²");
        assert_eq!(lines[3], "Tafel Equation: η = 70.000 · log(j / 26.83)");
    }
}

//! ASCII plotting for terminal previews.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - curves: one glyph per curve (`-` for smoothed fits, `*` for the Tafel line)

use crate::domain::CurveRecord;
use crate::fit::{PairFit, TafelAnalysis};

/// A curve layer and the glyph it is drawn with.
pub struct CurveLayer<'a> {
    pub points: &'a [(f64, f64)],
    pub glyph: char,
}

/// Preview of one batch chart.
pub fn render_pair_preview(
    fit: &PairFit,
    grid_points: usize,
    width: usize,
    height: usize,
) -> String {
    let points = fit.points.points();
    let curve = fit.smooth_curve(grid_points);
    render_ascii_plot(
        fit.pair.title,
        &points,
        &[CurveLayer { points: &curve, glyph: '-' }],
        width,
        height,
    )
}

/// Preview of a curve reloaded from JSON (curve only, no overlay points).
pub fn render_curve_record_preview(record: &CurveRecord, width: usize, height: usize) -> String {
    let curve = record.grid.points();
    let layer = CurveLayer {
        points: &curve,
        glyph: '-',
    };
    render_ascii_plot(&record.title, &[], &[layer], width, height)
}

/// Preview of the Tafel chart: samples, interpolated curve, and the fitted line if any.
///
/// The fitted line is layered first so the spline cannot hide it where the two overlap.
pub fn render_tafel_preview(
    analysis: &TafelAnalysis,
    line_points: usize,
    width: usize,
    height: usize,
) -> String {
    let points = analysis.series.points();
    let line = analysis
        .outcome
        .fit()
        .map(|f| f.line_points(line_points))
        .unwrap_or_default();
    render_ascii_plot(
        "Tafel (log10 j vs eta mV)",
        &points,
        &[
            CurveLayer { points: &line, glyph: '*' },
            CurveLayer {
                points: &analysis.interpolated,
                glyph: '-',
            },
        ],
        width,
        height,
    )
}

/// Render observed points over any number of curves on a `width x height` grid.
///
/// Later layers overwrite earlier ones only on blank cells; points always win.
pub fn render_ascii_plot(
    title: &str,
    points: &[(f64, f64)],
    curves: &[CurveLayer<'_>],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = axis_range(points, curves, |p| p.0).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = axis_range(points, curves, |p| p.1).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curves first so points can overlay.
    for layer in curves {
        draw_curve(&mut grid, layer.points, layer.glyph, (x_min, x_max), (y_min, y_max));
    }

    for &(x, y) in points {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {title} | x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn axis_range(
    points: &[(f64, f64)],
    curves: &[CurveLayer<'_>],
    coord: impl Fn(&(f64, f64)) -> f64,
) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in points.iter().chain(curves.iter().flat_map(|c| c.points.iter())) {
        let v = coord(p);
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo.is_finite() && hi.is_finite() && hi > lo {
        Some((lo, hi))
    } else if lo.is_finite() {
        Some((lo - 0.5, hi + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y max is row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    glyph: char,
    xr: (f64, f64),
    yr: (f64, f64),
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let col = map_x(x, xr.0, xr.1, width);
        let row = map_y(y, yr.0, yr.1, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, glyph),
            None if grid[row][col] == ' ' => grid[row][col] = glyph,
            None => {}
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TafelWindow;
    use crate::fit::{fit_tafel, interpolate_series, log_transform};

    #[test]
    fn plot_golden_snapshot_small() {
        let points = [(1.0, 100.0), (10.0, 110.0)];
        let curve = [(1.0, 100.0), (10.0, 100.0)];

        let txt = render_ascii_plot(
            "flat",
            &points,
            &[CurveLayer { points: &curve, glyph: '-' }],
            10,
            5,
        );
        let expected = concat!(
            "Plot: flat | x=[1.000, 10.000] | y=[99.50, 110.50]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn later_curves_do_not_overwrite_earlier_ones() {
        let a = [(0.0, 0.0), (9.0, 0.0)];
        let b = [(0.0, 0.0), (9.0, 9.0)];
        let txt = render_ascii_plot(
            "layers",
            &[],
            &[CurveLayer { points: &a, glyph: '-' }, CurveLayer { points: &b, glyph: '*' }],
            10,
            5,
        );
        let last = txt.lines().last().unwrap();
        assert!(last.starts_with('-'));
        assert!(txt.lines().nth(1).unwrap().ends_with('*'));
    }

    #[test]
    fn tafel_line_stays_visible_over_the_spline() {
        let j = [10.0, 31.6, 100.0, 316.0, 1000.0];
        let eta: Vec<f64> = j.iter().map(|v: &f64| 70.0 * v.log10()).collect();
        let series = log_transform(&j, &eta);
        let outcome = fit_tafel(&series, TafelWindow { lo: 0.5, hi: 3.5 });
        let analysis = TafelAnalysis {
            interpolated: interpolate_series(&series, 200),
            series,
            outcome,
            rows_used: j.len(),
        };
        assert!(analysis.outcome.fit().is_some());

        let txt = render_tafel_preview(&analysis, 50, 40, 12);
        let stars = txt.chars().filter(|c| *c == '*').count();
        // On exact Tafel data the spline lies on the line; the line must own those cells.
        assert!(stars >= 20, "only {stars} line cells visible:\n{txt}");
    }

    #[test]
    fn empty_input_still_renders_a_grid() {
        let txt = render_ascii_plot("empty", &[], &[], 10, 5);
        assert_eq!(txt.lines().count(), 6);
    }
}

//! Plotters-powered efficiency chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`, so the terminal figure and the PNG figure share
//! one drawing vocabulary.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One metric: raw points plus its smoothed curve.
pub struct MetricLayer<'a> {
    pub points: &'a [(f64, f64)],
    pub curve: &'a [(f64, f64)],
    pub color: RGBColor,
}

/// A render-only chart description; all series and bounds are computed outside `render`.
pub struct EfficiencyPlottersChart<'a> {
    pub layers: &'a [MetricLayer<'a>],
    /// Evaluated values at the committed power level.
    pub markers: &'a [((f64, f64), RGBColor)],
    /// Committed power level (solid cursor).
    pub committed_x: f64,
    /// Pending power level while the slider is being moved.
    pub pending_x: Option<f64>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl<'a> Widget for EfficiencyPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite())
            || x1 <= x0
            || y1 <= y0
        {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines clutter low-resolution cells; axes and labels are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let cursor = RGBColor(160, 160, 160);
            chart.draw_series(LineSeries::new(
                [(self.committed_x, y0), (self.committed_x, y1)],
                &cursor,
            ))?;
            if let Some(px) = self.pending_x {
                chart.draw_series(LineSeries::new([(px, y0), (px, y1)], &YELLOW))?;
            }

            for layer in self.layers {
                chart.draw_series(LineSeries::new(layer.curve.iter().copied(), &layer.color))?;
                chart.draw_series(layer.points.iter().map(|&p| Pixel::new(p, layer.color)))?;
            }

            // `Circle` radii are mis-scaled by the terminal backend (pixel radius
            // mapped to canvas units), so markers are a small cross of pixels.
            let (dx, dy) = ((x1 - x0) / 200.0, (y1 - y0) / 100.0);
            for &((x, y), color) in self.markers {
                chart.draw_series(
                    [(x, y), (x - dx, y), (x + dx, y), (x, y - dy), (x, y + dy)]
                        .into_iter()
                        .map(|p| Pixel::new(p, WHITE)),
                )?;
                chart.draw_series(std::iter::once(Pixel::new((x, y), color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

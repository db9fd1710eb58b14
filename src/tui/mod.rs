//! Ratatui-based terminal UI for the efficiency slider.
//!
//! The figure shows the four efficiency metrics against power level with a
//! marker and value at the committed power level. Arrow keys move the slider;
//! only `Enter` commits, re-evaluates the stored fits and redraws.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::domain::SeriesColor;
use crate::fit::{EfficiencyFits, Reading};
use crate::plot::{ChartBounds, chart_bounds, efficiency_series};
use crate::error::AppError;

mod plotters_chart;
pub mod slider;

use plotters_chart::{EfficiencyPlottersChart, MetricLayer};
pub use slider::PowerSlider;

/// Steps moved by PageUp/PageDown.
const PAGE_STEPS: i64 = 10;

/// Start the slider UI; returns the last committed power level.
pub fn run(fits: EfficiencyFits, step: f64, grid_points: usize) -> Result<f64, AppError> {
    let mut app = App::new(fits, step, grid_points);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)?;
    Ok(app.slider.committed())
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    fits: EfficiencyFits,
    slider: PowerSlider,
    readings: Vec<Reading>,
    /// Scatter and curve per metric, computed once.
    series: Vec<(Vec<(f64, f64)>, Vec<(f64, f64)>)>,
    bounds: ChartBounds,
    status: String,
}

impl App {
    fn new(fits: EfficiencyFits, step: f64, grid_points: usize) -> Self {
        let series = efficiency_series(&fits, grid_points);
        let all: Vec<&[(f64, f64)]> = series
            .iter()
            .flat_map(|(points, curve)| [points.as_slice(), curve.as_slice()])
            .collect();
        let bounds = chart_bounds(&all, 0.05).unwrap_or(ChartBounds {
            x: [0.0, 1.0],
            y: [0.0, 1.0],
        });

        let slider = PowerSlider::new(fits.power_range.0, fits.power_range.1, step);
        let readings = fits.readings_at(slider.committed());

        Self {
            fits,
            slider,
            readings,
            series,
            bounds,
            status: "Move with ←/→, commit with Enter.".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply one key; returns `true` to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.slider.nudge(-1),
            KeyCode::Right => self.slider.nudge(1),
            KeyCode::PageDown | KeyCode::Down => self.slider.nudge(-PAGE_STEPS),
            KeyCode::PageUp | KeyCode::Up => self.slider.nudge(PAGE_STEPS),
            KeyCode::Home => self.slider.set_pending(self.slider.range().0),
            KeyCode::End => self.slider.set_pending(self.slider.range().1),
            KeyCode::Enter => self.commit(),
            _ => {}
        }
        false
    }

    fn commit(&mut self) {
        let power = self.slider.commit();
        self.readings = self.fits.readings_at(power);
        log::debug!("committed power level {power:.1}%");
        self.status = format!("Committed {power:.1}%.");
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (lo, hi) = self.slider.range();
        let lines = vec![
            Line::from(vec![
                Span::styled("elx", Style::default().fg(Color::Cyan)),
                Span::raw(" Smoothed Efficiency Metrics vs Power Level (%)"),
            ]),
            Line::from(Span::styled(
                format!(
                    "rows: {} | power level: [{lo:.1}, {hi:.1}]% | step: {}",
                    self.fits.rows_used(),
                    self.slider.step()
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3), Constraint::Length(6)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_slider(frame, chunks[1]);
        self.draw_readings(frame, chunks[2]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Efficiency").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let layers: Vec<MetricLayer<'_>> = self
            .fits
            .metrics
            .iter()
            .zip(self.series.iter())
            .map(|(m, (points, curve))| MetricLayer {
                points,
                curve,
                color: plot_color(m.metric.color),
            })
            .collect();
        let markers: Vec<((f64, f64), RGBColor)> = self
            .readings
            .iter()
            .map(|r| ((r.power_level, r.value), plot_color(r.metric.color)))
            .collect();

        let (chart_rect, insets) = chart_layout(inner);
        let widget = EfficiencyPlottersChart {
            layers: &layers,
            markers: &markers,
            committed_x: self.slider.committed(),
            pending_x: self.slider.is_dirty().then(|| self.slider.pending()),
            x_bounds: self.bounds.x,
            y_bounds: self.bounds.y,
            x_label: "power level (%)",
            y_label: "efficiency",
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, self.bounds.x, self.bounds.y);
        }
    }

    fn draw_slider(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Power Level").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = if self.slider.is_dirty() {
            format!(
                " {:.1}% (committed {:.1}%, Enter to apply)",
                self.slider.pending(),
                self.slider.committed()
            )
        } else {
            format!(" {:.1}%", self.slider.committed())
        };
        let track_width = (inner.width as usize).saturating_sub(label.chars().count() + 1);
        let line = Line::from(vec![
            Span::styled(slider_track(&self.slider, track_width), Style::default().fg(Color::Cyan)),
            Span::styled(
                label,
                if self.slider.is_dirty() {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::White)
                },
            ),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn draw_readings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .readings
            .iter()
            .map(|r| ListItem::new(reading_line(r)))
            .collect();

        let title = format!("Readings at {:.1}%", self.slider.committed());
        let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ step  PgUp/PgDn ×10  Home/End  Enter commit  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn plot_color(c: SeriesColor) -> RGBColor {
    let (r, g, b) = c.rgb();
    RGBColor(r, g, b)
}

/// Colour swatch in the metric's series colour, then the marker label.
fn reading_line(reading: &Reading) -> Line<'static> {
    let (red, green, blue) = reading.metric.color.rgb();
    Line::from(vec![
        Span::styled(
            "■",
            Style::default()
                .fg(Color::Rgb(red, green, blue))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(reading.label()),
    ])
}

/// Text track with a `|` knob at the pending position.
fn slider_track(slider: &PowerSlider, width: usize) -> String {
    if width < 3 {
        return String::new();
    }
    let inner = width - 2;
    let knob = (slider.fraction().clamp(0.0, 1.0) * (inner as f64 - 1.0)).round() as usize;
    let mut out = String::with_capacity(width);
    out.push('[');
    for i in 0..inner {
        out.push(if i == knob { '|' } else { '-' });
    }
    out.push(']');
    out
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.0}");
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label.len() as u16;
        let rect = Rect {
            x: start,
            y,
            width,
            height: 1,
        };
        frame.render_widget(Paragraph::new(label).style(style), rect);
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.2}");
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let width = label.len() as u16;
        let rect = Rect {
            x: start,
            y,
            width,
            height: 1,
        };
        frame.render_widget(Paragraph::new(label).style(style), rect);
    }

    let x_label = Paragraph::new("power level (%)")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("eff.")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, Measurement, MeasurementTable, SmoothingConfig};
    use crate::fit::fit_efficiency_curves;

    fn fits() -> EfficiencyFits {
        let rows = (0..20)
            .map(|i| {
                let p = 10.0 + 4.0 * i as f64;
                let mut m = Measurement::default();
                m.set(Column::PowerLevel, Some(p));
                m.set(Column::VoltageEfficiency, Some(0.9 - 0.002 * p));
                m.set(Column::FaradayEfficiency, Some(0.97));
                m.set(Column::CellEfficiency, Some(0.85 - 0.002 * p));
                m.set(Column::OverallEfficiency, Some(0.8 - 0.002 * p));
                m
            })
            .collect();
        fit_efficiency_curves(&MeasurementTable::new(rows), &SmoothingConfig::default()).unwrap()
    }

    #[test]
    fn arrows_do_not_refresh_readings_until_enter() {
        let mut app = App::new(fits(), 0.1, 50);
        let before = app.readings.clone();
        assert!((before[0].power_level - 10.0).abs() < 1e-12);

        for _ in 0..30 {
            assert!(!app.handle_key(KeyCode::Right));
        }
        assert_eq!(app.readings, before);

        app.handle_key(KeyCode::Enter);
        assert!((app.readings[0].power_level - 13.0).abs() < 1e-9);
        assert!((app.readings[0].value - (0.9 - 0.026)).abs() < 1e-6);
    }

    #[test]
    fn end_and_home_jump_to_range_limits() {
        let mut app = App::new(fits(), 0.1, 50);
        app.handle_key(KeyCode::End);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.slider.committed(), 86.0);
        app.handle_key(KeyCode::Home);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.slider.committed(), 10.0);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn readings_panel_shows_two_decimal_labels() {
        let mut app = App::new(fits(), 0.1, 50);
        app.slider.set_pending(50.0);
        app.handle_key(KeyCode::Enter);

        let text: Vec<String> = app
            .readings
            .iter()
            .map(|r| {
                reading_line(r)
                    .spans
                    .iter()
                    .map(|s| s.content.as_ref())
                    .collect()
            })
            .collect();
        assert_eq!(text[0], "■  Voltage: 0.80");
        assert_eq!(text[1], "■  Faraday: 0.97");
        assert_eq!(text[2], "■  Cell: 0.75");
        assert_eq!(text[3], "■  Overall: 0.70");
    }

    #[test]
    fn track_places_knob_by_fraction() {
        let mut s = PowerSlider::new(0.0, 10.0, 1.0);
        assert_eq!(slider_track(&s, 7), "[|----]");
        s.set_pending(10.0);
        assert_eq!(slider_track(&s, 7), "[----|]");
        assert_eq!(slider_track(&s, 2), "");
    }
}

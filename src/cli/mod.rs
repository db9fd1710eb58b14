//! Command-line parsing for the electrolyzer curve tool.
//!
//! Argument parsing and command dispatch are kept apart from the fitting and
//! rendering code; flags are turned into the plain config structs of
//! `domain::types` by `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_GRID_POINTS, DEFAULT_INPUT, DEFAULT_POLY_DEGREE, DEFAULT_SLIDER_STEP,
    DEFAULT_TAFEL_LINE_POINTS, DEFAULT_TAFEL_WINDOW, RowPolicy, STANDARD_POTENTIAL_V,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "elx", version, about = "Electrolyzer test-bench curve fitting and plots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Smooth every metric pair and write one PNG per pair (default).
    Plot(PlotArgs),
    /// Interactive efficiency figure with a power-level slider.
    Slider(SliderArgs),
    /// Render the efficiency figure at one power level to PNG.
    Efficiency(EfficiencyArgs),
    /// Tafel analysis: slope, exchange current density and chart.
    Tafel(TafelArgs),
    /// Preview a curve JSON written by `elx plot --export-curves`.
    Show(ShowArgs),
    /// Write a synthetic bench table as CSV.
    Sample(SampleArgs),
}

/// Spreadsheet input shared by the analysis commands.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Bench spreadsheet (.xlsx/.xls/.xlsb/.ods, first sheet) or .csv.
    #[arg(short = 'i', long, default_value = DEFAULT_INPUT)]
    pub input: PathBuf,
}

/// Polynomial smoothing knobs.
#[derive(Debug, Args, Clone)]
pub struct SmoothingArgs {
    /// Polynomial degree of the smoothing fit.
    #[arg(long, default_value_t = DEFAULT_POLY_DEGREE)]
    pub degree: usize,

    /// Number of x values the smoothed curve is drawn on.
    #[arg(long, default_value_t = DEFAULT_GRID_POINTS)]
    pub grid_points: usize,
}

/// Options for the batch charts.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub smoothing: SmoothingArgs,

    /// Directory the PNG files are written to (existing files are overwritten).
    #[arg(short = 'o', long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Which rows each chart may use.
    #[arg(long, value_enum, default_value_t = RowPolicy::PerPair)]
    pub rows: RowPolicy,

    /// PNG width (pixels).
    #[arg(long, default_value_t = 640)]
    pub image_width: u32,

    /// PNG height (pixels).
    #[arg(long, default_value_t = 480)]
    pub image_height: u32,

    /// Also print an ASCII preview of every chart.
    #[arg(long)]
    pub preview: bool,

    /// Preview width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Preview height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export every fitted curve (coefficients, diagnostics, grid) to JSON.
    #[arg(long = "export-curves", value_name = "JSON")]
    pub export_curves: Option<PathBuf>,
}

/// Options for the interactive slider.
#[derive(Debug, Args, Clone)]
pub struct SliderArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub smoothing: SmoothingArgs,

    /// Slider increment (power level %).
    #[arg(long, default_value_t = DEFAULT_SLIDER_STEP)]
    pub step: f64,
}

/// Options for the static efficiency figure.
#[derive(Debug, Args, Clone)]
pub struct EfficiencyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub smoothing: SmoothingArgs,

    /// Power level (%) to annotate; defaults to the lowest observed level.
    #[arg(long)]
    pub at: Option<f64>,

    /// Grid the annotated power level is snapped to.
    #[arg(long, default_value_t = DEFAULT_SLIDER_STEP)]
    pub step: f64,

    /// Output PNG.
    #[arg(short = 'o', long, default_value = "Efficiency_Metrics_vs_Power_Level.png")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 1000)]
    pub image_width: u32,

    #[arg(long, default_value_t = 600)]
    pub image_height: u32,
}

/// Options for the Tafel analysis.
#[derive(Debug, Args, Clone)]
pub struct TafelArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Reversible cell potential E0 (V) used for the overpotential.
    #[arg(long, default_value_t = STANDARD_POTENTIAL_V)]
    pub e0: f64,

    /// Lower bound (inclusive) of the log10(current density) fit window.
    #[arg(long, default_value_t = DEFAULT_TAFEL_WINDOW.lo)]
    pub window_lo: f64,

    /// Upper bound (exclusive) of the log10(current density) fit window.
    #[arg(long, default_value_t = DEFAULT_TAFEL_WINDOW.hi)]
    pub window_hi: f64,

    /// Points on the interpolated curve.
    #[arg(long, default_value_t = DEFAULT_GRID_POINTS)]
    pub grid_points: usize,

    /// Points on the fitted Tafel line.
    #[arg(long, default_value_t = DEFAULT_TAFEL_LINE_POINTS)]
    pub line_points: usize,

    /// Output PNG.
    #[arg(short = 'o', long, default_value = "Tafel_Plot.png")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 800)]
    pub image_width: u32,

    #[arg(long, default_value_t = 600)]
    pub image_height: u32,

    /// Also print an ASCII preview of the chart.
    #[arg(long)]
    pub preview: bool,

    /// Preview width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Preview height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for previewing a saved curve file.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Curve JSON file produced by `elx plot --export-curves`.
    #[arg(long, value_name = "JSON")]
    pub curves: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for the synthetic bench table.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV.
    #[arg(short = 'o', long, default_value = "bench.csv")]
    pub out: PathBuf,

    /// Number of rows (power level sweep points).
    #[arg(short = 'n', long, default_value_t = 40)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Relative standard deviation of measurement noise.
    #[arg(long, default_value_t = 0.005)]
    pub noise: f64,

    /// Probability that a reading is written as "n/a".
    #[arg(long, default_value_t = 0.0)]
    pub gap_prob: f64,
}

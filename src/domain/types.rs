//! Shared domain types.
//!
//! These types are kept lightweight and (where useful) serializable so they can be:
//!
//! - used in-memory during fitting and rendering
//! - exported to the curve JSON file
//! - reloaded later for terminal previews

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::math::PolyCurve;

/// Number of columns in the bench spreadsheet.
pub const COLUMN_COUNT: usize = 20;

/// Default spreadsheet path (relative to the working directory).
pub const DEFAULT_INPUT: &str = "Book1.xlsx";

/// Polynomial degree used for smoothing.
///
/// Degree 10 is inherited from the bench evaluation workflow; its rationale
/// has not been confirmed and it is deliberately kept overridable.
pub const DEFAULT_POLY_DEGREE: usize = 10;

/// Number of evenly spaced x values used to draw a smoothed curve.
pub const DEFAULT_GRID_POINTS: usize = 200;

/// Number of evenly spaced x values used to draw the Tafel line.
pub const DEFAULT_TAFEL_LINE_POINTS: usize = 100;

/// Reversible cell potential used for the overpotential (V).
pub const STANDARD_POTENTIAL_V: f64 = 1.23;

/// Hand-tuned log10(current density) window assumed to be kinetically controlled.
pub const DEFAULT_TAFEL_WINDOW: TafelWindow = TafelWindow { lo: 2.0, hi: 2.3 };

/// Slider increment for the power level (%).
pub const DEFAULT_SLIDER_STEP: f64 = 0.1;

/// The fixed bench columns, in spreadsheet order.
///
/// Header text in the sheet is ignored; columns are named by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "Power_Level")]
    PowerLevel,
    #[serde(rename = "Voltage")]
    Voltage,
    #[serde(rename = "Current")]
    Current,
    #[serde(rename = "Surface_Area")]
    SurfaceArea,
    #[serde(rename = "Hydrogen_Volume_Flow")]
    HydrogenVolumeFlow,
    #[serde(rename = "Valve_Output")]
    ValveOutput,
    #[serde(rename = "Temperature")]
    Temperature,
    #[serde(rename = "Pressure")]
    Pressure,
    #[serde(rename = "Voltage_Cell")]
    VoltageCell,
    #[serde(rename = "Current_Density")]
    CurrentDensity,
    #[serde(rename = "Current_Cell")]
    CurrentCell,
    #[serde(rename = "Real_Hydrogen_Volume_Flow_m3")]
    RealHydrogenVolumeFlowM3,
    #[serde(rename = "Real_Hydrogen_Volume_Flow_kg")]
    RealHydrogenVolumeFlowKg,
    #[serde(rename = "Mass_Flow_kg_s")]
    MassFlowKgS,
    #[serde(rename = "Hydrogen_Mol_Flow")]
    HydrogenMolFlow,
    #[serde(rename = "Voltage_Efficiency")]
    VoltageEfficiency,
    #[serde(rename = "Faraday_Efficiency")]
    FaradayEfficiency,
    #[serde(rename = "Cell_Efficiency")]
    CellEfficiency,
    #[serde(rename = "Power")]
    Power,
    #[serde(rename = "Overall_Efficiency")]
    OverallEfficiency,
}

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::PowerLevel,
        Column::Voltage,
        Column::Current,
        Column::SurfaceArea,
        Column::HydrogenVolumeFlow,
        Column::ValveOutput,
        Column::Temperature,
        Column::Pressure,
        Column::VoltageCell,
        Column::CurrentDensity,
        Column::CurrentCell,
        Column::RealHydrogenVolumeFlowM3,
        Column::RealHydrogenVolumeFlowKg,
        Column::MassFlowKgS,
        Column::HydrogenMolFlow,
        Column::VoltageEfficiency,
        Column::FaradayEfficiency,
        Column::CellEfficiency,
        Column::Power,
        Column::OverallEfficiency,
    ];

    /// Position of the column in the sheet.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Semantic column name (also used in exports and file names).
    pub fn name(self) -> &'static str {
        match self {
            Column::PowerLevel => "Power_Level",
            Column::Voltage => "Voltage",
            Column::Current => "Current",
            Column::SurfaceArea => "Surface_Area",
            Column::HydrogenVolumeFlow => "Hydrogen_Volume_Flow",
            Column::ValveOutput => "Valve_Output",
            Column::Temperature => "Temperature",
            Column::Pressure => "Pressure",
            Column::VoltageCell => "Voltage_Cell",
            Column::CurrentDensity => "Current_Density",
            Column::CurrentCell => "Current_Cell",
            Column::RealHydrogenVolumeFlowM3 => "Real_Hydrogen_Volume_Flow_m3",
            Column::RealHydrogenVolumeFlowKg => "Real_Hydrogen_Volume_Flow_kg",
            Column::MassFlowKgS => "Mass_Flow_kg_s",
            Column::HydrogenMolFlow => "Hydrogen_Mol_Flow",
            Column::VoltageEfficiency => "Voltage_Efficiency",
            Column::FaradayEfficiency => "Faraday_Efficiency",
            Column::CellEfficiency => "Cell_Efficiency",
            Column::Power => "Power",
            Column::OverallEfficiency => "Overall_Efficiency",
        }
    }

    /// Unit written in the units row of generated sheets.
    pub fn unit(self) -> &'static str {
        match self {
            Column::PowerLevel | Column::ValveOutput => "%",
            Column::Voltage | Column::VoltageCell => "V",
            Column::Current | Column::CurrentCell => "A",
            Column::SurfaceArea => "cm²",
            Column::HydrogenVolumeFlow => "Nl/h",
            Column::Temperature => "°C",
            Column::Pressure => "bar",
            Column::CurrentDensity => "mA/cm²",
            Column::RealHydrogenVolumeFlowM3 => "m³n/h",
            Column::RealHydrogenVolumeFlowKg => "kg/h",
            Column::MassFlowKgS => "kg/s",
            Column::HydrogenMolFlow => "mol/s",
            Column::Power => "W",
            Column::VoltageEfficiency
            | Column::FaradayEfficiency
            | Column::CellEfficiency
            | Column::OverallEfficiency => "-",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed series colours (matplotlib named colours used by the bench reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesColor {
    Blue,
    Green,
    Red,
    Purple,
    Orange,
    Cyan,
    Magenta,
}

impl SeriesColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            SeriesColor::Blue => (0, 0, 255),
            SeriesColor::Green => (0, 128, 0),
            SeriesColor::Red => (255, 0, 0),
            SeriesColor::Purple => (128, 0, 128),
            SeriesColor::Orange => (255, 165, 0),
            SeriesColor::Cyan => (0, 255, 255),
            SeriesColor::Magenta => (255, 0, 255),
        }
    }
}

/// One batch chart: a smoothed `y` against `x`, with its styling and file name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPair {
    pub x: Column,
    pub y: Column,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    /// Legend entry of the smoothed curve.
    pub series_label: &'static str,
    pub color: SeriesColor,
    pub file_name: &'static str,
}

const POWER_LEVEL_LABEL: &str = "Power Level (%)";
const CURRENT_DENSITY_LABEL: &str = "Current Density (mA/cm^2)";
const VOLTAGE_CELL_LABEL: &str = "Voltage Cell (V)";

/// The batch chart catalogue.
pub const DEFAULT_PAIRS: [MetricPair; 11] = [
    MetricPair {
        x: Column::PowerLevel,
        y: Column::CurrentDensity,
        title: "Power Level vs Current Density",
        x_label: POWER_LEVEL_LABEL,
        y_label: CURRENT_DENSITY_LABEL,
        series_label: "Current Density (smoothed)",
        color: SeriesColor::Orange,
        file_name: "Power_Level_vs_Current_Density.png",
    },
    MetricPair {
        x: Column::PowerLevel,
        y: Column::VoltageCell,
        title: "Power Level vs Voltage Cell",
        x_label: POWER_LEVEL_LABEL,
        y_label: VOLTAGE_CELL_LABEL,
        series_label: "Voltage Cell (smoothed)",
        color: SeriesColor::Purple,
        file_name: "Power_Level_vs_Voltage_Cell.png",
    },
    MetricPair {
        x: Column::CurrentDensity,
        y: Column::RealHydrogenVolumeFlowM3,
        title: "Current Density vs Hydrogen Volume Flow",
        x_label: CURRENT_DENSITY_LABEL,
        y_label: "Hydrogen Volume Flow (m³n/h)",
        series_label: "Hydrogen Volume Flow (smoothed)",
        color: SeriesColor::Red,
        file_name: "Current_Density_vs_Hydrogen_Volume_Flow.png",
    },
    MetricPair {
        x: Column::VoltageCell,
        y: Column::RealHydrogenVolumeFlowM3,
        title: "Voltage Cell vs Hydrogen Volume Flow",
        x_label: VOLTAGE_CELL_LABEL,
        y_label: "Hydrogen Volume Flow (m³n/h)",
        series_label: "Hydrogen Volume Flow (smoothed)",
        color: SeriesColor::Green,
        file_name: "Voltage_Cell_vs_Real_Hydrogen_Volume_Flow.png",
    },
    MetricPair {
        x: Column::VoltageCell,
        y: Column::VoltageEfficiency,
        title: "Voltage Cell vs Voltage Efficiency",
        x_label: VOLTAGE_CELL_LABEL,
        y_label: "Voltage Efficiency (ηV)",
        series_label: "Voltage Efficiency (smoothed)",
        color: SeriesColor::Blue,
        file_name: "Voltage_Cell_vs_Voltage_Efficiency.png",
    },
    MetricPair {
        x: Column::CurrentDensity,
        y: Column::FaradayEfficiency,
        title: "Current Density vs Faraday Efficiency",
        x_label: CURRENT_DENSITY_LABEL,
        y_label: "Faraday Efficiency (ηF)",
        series_label: "Faraday Efficiency (smoothed)",
        color: SeriesColor::Cyan,
        file_name: "Current_Density_vs_Faraday_Efficiency.png",
    },
    MetricPair {
        x: Column::PowerLevel,
        y: Column::FaradayEfficiency,
        title: "Power Level vs Faraday Efficiency",
        x_label: POWER_LEVEL_LABEL,
        y_label: "Faraday Efficiency (ηF)",
        series_label: "Faraday Efficiency (smoothed)",
        color: SeriesColor::Magenta,
        file_name: "Power_Level_vs_Faraday_Efficiency.png",
    },
    MetricPair {
        x: Column::PowerLevel,
        y: Column::VoltageEfficiency,
        title: "Power Level vs Voltage Efficiency",
        x_label: POWER_LEVEL_LABEL,
        y_label: "Voltage Efficiency (ηV)",
        series_label: "Voltage Efficiency (smoothed)",
        color: SeriesColor::Blue,
        file_name: "Power_Level_vs_Voltage_Efficiency.png",
    },
    MetricPair {
        x: Column::PowerLevel,
        y: Column::RealHydrogenVolumeFlowM3,
        title: "Power Level vs Hydrogen Volume Flow",
        x_label: POWER_LEVEL_LABEL,
        y_label: "Hydrogen Volume Flow (m³/h)",
        series_label: "Real Hydrogen Volume Flow (smoothed)",
        color: SeriesColor::Red,
        file_name: "Power_Level_vs_Hydrogen_Volume_Flow.png",
    },
    MetricPair {
        x: Column::PowerLevel,
        y: Column::CellEfficiency,
        title: "Power Level vs Cell Efficiency",
        x_label: POWER_LEVEL_LABEL,
        y_label: "Cell Efficiency(ηcell)",
        series_label: "Cell Efficiency (smoothed)",
        color: SeriesColor::Green,
        file_name: "Power_Level_vs_Cell_Efficiency.png",
    },
    MetricPair {
        x: Column::PowerLevel,
        y: Column::OverallEfficiency,
        title: "Power Level vs Overall Efficiency",
        x_label: POWER_LEVEL_LABEL,
        y_label: "Overall Efficiency(ηOverall)",
        series_label: "Overall Efficiency (smoothed)",
        color: SeriesColor::Purple,
        file_name: "Power_Level_vs_Overall_Efficiency.png",
    },
];

/// One efficiency metric shown on the slider figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyMetric {
    pub column: Column,
    /// Short label used for the value annotation (`"Voltage: 0.72"`).
    pub short_label: &'static str,
    /// Legend entry of the smoothed curve.
    pub legend: &'static str,
    pub color: SeriesColor,
}

/// The four efficiency metrics, in drawing order.
pub const EFFICIENCY_METRICS: [EfficiencyMetric; 4] = [
    EfficiencyMetric {
        column: Column::VoltageEfficiency,
        short_label: "Voltage",
        legend: "Voltage Efficiency",
        color: SeriesColor::Blue,
    },
    EfficiencyMetric {
        column: Column::FaradayEfficiency,
        short_label: "Faraday",
        legend: "Faraday Efficiency",
        color: SeriesColor::Green,
    },
    EfficiencyMetric {
        column: Column::CellEfficiency,
        short_label: "Cell",
        legend: "Cell Efficiency",
        color: SeriesColor::Red,
    },
    EfficiencyMetric {
        column: Column::OverallEfficiency,
        short_label: "Overall",
        legend: "Overall Efficiency",
        color: SeriesColor::Purple,
    },
];

/// Which rows a batch chart may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RowPolicy {
    /// Each chart uses every row that has both of its own values.
    PerPair,
    /// Drop rows missing any column used by any chart in the run.
    Shared,
}

/// Half-open `[lo, hi)` window over log10(current density).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TafelWindow {
    pub lo: f64,
    pub hi: f64,
}

impl TafelWindow {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.lo && x < self.hi
    }
}

/// Polynomial smoothing knobs shared by the batch and slider pipelines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingConfig {
    pub degree: usize,
    pub grid_points: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            degree: DEFAULT_POLY_DEGREE,
            grid_points: DEFAULT_GRID_POINTS,
        }
    }
}

/// Configuration of the batch chart run (`elx plot`).
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub smoothing: SmoothingConfig,
    pub row_policy: RowPolicy,
    pub pairs: Vec<MetricPair>,
    pub image_size: (u32, u32),
    pub preview: bool,
    pub preview_width: usize,
    pub preview_height: usize,
    pub export_curves: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            out_dir: PathBuf::from("."),
            smoothing: SmoothingConfig::default(),
            row_policy: RowPolicy::PerPair,
            pairs: DEFAULT_PAIRS.to_vec(),
            image_size: (640, 480),
            preview: false,
            preview_width: 80,
            preview_height: 20,
            export_curves: None,
        }
    }
}

/// Configuration of the efficiency figure (`elx slider`, `elx efficiency`).
#[derive(Debug, Clone)]
pub struct EfficiencyConfig {
    pub input: PathBuf,
    pub smoothing: SmoothingConfig,
    pub step: f64,
    /// Power level to annotate; `None` means the lowest observed level.
    pub at: Option<f64>,
    pub out_file: PathBuf,
    pub image_size: (u32, u32),
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            smoothing: SmoothingConfig::default(),
            step: DEFAULT_SLIDER_STEP,
            at: None,
            out_file: PathBuf::from("Efficiency_Metrics_vs_Power_Level.png"),
            image_size: (1000, 600),
        }
    }
}

/// Configuration of the Tafel analysis (`elx tafel`).
#[derive(Debug, Clone)]
pub struct TafelConfig {
    pub input: PathBuf,
    pub standard_potential_v: f64,
    pub window: TafelWindow,
    pub grid_points: usize,
    pub line_points: usize,
    pub out_file: PathBuf,
    pub image_size: (u32, u32),
    pub preview: bool,
    pub preview_width: usize,
    pub preview_height: usize,
}

impl Default for TafelConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            standard_potential_v: STANDARD_POTENTIAL_V,
            window: DEFAULT_TAFEL_WINDOW,
            grid_points: DEFAULT_GRID_POINTS,
            line_points: DEFAULT_TAFEL_LINE_POINTS,
            out_file: PathBuf::from("Tafel_Plot.png"),
            image_size: (800, 600),
            preview: false,
            preview_width: 80,
            preview_height: 20,
        }
    }
}

/// Configuration of the synthetic bench table generator (`elx sample`).
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub out: PathBuf,
    pub rows: usize,
    pub seed: u64,
    /// Relative standard deviation of the measurement noise.
    pub noise: f64,
    /// Probability that a measured cell is replaced by a non-numeric marker.
    pub gap_prob: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            out: PathBuf::from("bench.csv"),
            rows: 40,
            seed: 42,
            noise: 0.005,
            gap_prob: 0.0,
        }
    }
}

/// Curve export file written by `elx plot --export-curves`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    /// Spreadsheet the curves were fitted on.
    pub source: String,
    pub degree: usize,
    pub grid_points: usize,
    pub curves: Vec<CurveRecord>,
}

/// One smoothed metric pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRecord {
    pub title: String,
    pub x: Column,
    pub y: Column,
    pub x_label: String,
    pub y_label: String,
    pub n_points: usize,
    pub sse: f64,
    pub rmse: f64,
    pub curve: PolyCurve,
    pub grid: CurveGrid,
}

/// Precomputed curve values for quick plotting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl CurveGrid {
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }
}

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fixed 20-column bench layout (`Column`)
//! - the chart catalogue (`MetricPair`, `SeriesColor`, `DEFAULT_PAIRS`)
//! - per-pipeline configuration (`BatchConfig`, `EfficiencyConfig`, `TafelConfig`, `SampleConfig`)
//! - the cleaned measurement table (`MeasurementTable`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;

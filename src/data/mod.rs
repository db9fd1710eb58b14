//! Data sources other than a bench spreadsheet.
//!
//! - synthetic bench tables for demos and tests (`sample`)

pub mod sample;

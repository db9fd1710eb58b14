//! Chart rendering: PNG files via Plotters and fixed-size terminal previews.

pub mod ascii;
pub mod png;

pub use ascii::*;
pub use png::*;

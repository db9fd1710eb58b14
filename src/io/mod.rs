//! Input/output helpers.
//!
//! - spreadsheet ingest + cleaning (`ingest`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod ingest;

pub use curve::*;
pub use ingest::*;

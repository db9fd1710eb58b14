//! Curve fitting for the three pipelines.
//!
//! Responsibilities:
//!
//! - smooth each batch metric pair with a least-squares polynomial
//! - fit the four efficiency curves behind the slider figure
//! - run the Tafel analysis (overpotential, log transform, windowed line fit)

pub mod efficiency;
pub mod smoothing;
pub mod tafel;

pub use efficiency::*;
pub use smoothing::*;
pub use tafel::*;

//! Numerical building blocks: least squares, polynomial smoothing, linear
//! regression, cubic interpolation and evaluation grids.

pub mod grid;
pub mod linreg;
pub mod ols;
pub mod poly;
pub mod spline;

pub use grid::*;
pub use linreg::*;
pub use ols::*;
pub use poly::*;
pub use spline::*;

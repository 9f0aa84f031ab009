//! Numerical helpers: summary statistics, special functions and quadrature.
pub mod quadrature;
pub mod special;
mod stats;

pub use stats::*;

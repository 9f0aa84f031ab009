//! Empirical reproduction numbers from simulator event logs.
//!
//! An individual based simulator writes one line per infection: `[PRIM]` for
//! the primary (index) case and `[TRAN]` for every transmission. Replaying a
//! log rebuilds who infected whom, from which secondary case counts, daily Rt
//! and dispersion measures follow.
mod dispersion;
mod parser;
mod record;
pub mod summary;

pub use dispersion::*;
pub use parser::*;
pub use record::*;

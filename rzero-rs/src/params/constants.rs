use crate::prelude::{Day, Real};

///////////////////////////////////////////////////////////////////////////////
// Default values used by the estimation and post-processing tools
///////////////////////////////////////////////////////////////////////////////

pub const INFECTIOUS_PERIOD_LENGTHS: [Day; 4] = [6, 7, 8, 9];
pub const TRANSMISSION_PROBABILITIES: [Real; 4] = [0.025, 0.05, 0.075, 0.10];
pub const OVERDISPERSION: Real = 0.4;

/// Absolute error accepted when integrating over individual infectiousness.
pub const QUADRATURE_TOLERANCE: Real = 1.49e-2;

/// Runs with this many secondary cases or fewer count as extinct.
pub const EXTINCTION_THRESHOLD: u64 = 20;
pub const NUM_DAYS: Day = 120;
pub const WORKERS: usize = 4;

/// Share of secondary cases used by the P80 dispersion statistic.
pub const P80_SHARE: Real = 0.80;

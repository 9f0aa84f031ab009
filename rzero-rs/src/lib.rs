//! Estimate reproduction numbers of an age-structured synthetic population.
//!
//! Two routes are provided. The analytic route combines survey contact rates
//! ([`contact`]), pool membership ([`pop`]) and an infectious period model to
//! compute the expected number of secondary cases of each person
//! ([`estimator`], fanned out by [`sampler`]). The empirical route rebuilds the
//! infector -> infected graph from the event log of an individual based
//! simulator and derives secondary cases, Rt and dispersion ([`events`]).
pub mod config;
pub mod contact;
pub mod error;
pub mod estimator;
pub mod events;
pub mod parallel;
pub mod params;
pub mod pop;
pub mod prelude;
pub mod sampler;
pub mod utils;

pub use crate::error::{Result, RzeroError};
pub use crate::estimator::{ContactNormalization, EffectiveContactEstimator};
pub use crate::sampler::{Aggregate, PersonSelection, ReproductionNumberSampler, Scenario};

/// Basic representation of time. Simulation days are counted from zero.
pub type Day = u32;

/// Base Real type used by this crate. Uses an alias to easily change precision
/// if necessary.
pub type Real = f64;

/// Age of a person, in years.
pub type Age = u32;

/// Person handle. Ids are assigned sequentially from 1 in input order.
pub type Id = u64;

/// Maximum age supported by contact matrices and populations.
pub const MAX_AGE: Age = 111;

/// Probability used instead of 1 for certain contacts. Keeps `1 - p * c`
/// strictly positive.
pub const MAX_CONTACT_PROBABILITY: Real = 0.999;

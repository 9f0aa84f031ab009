//! Transmission parameters.
//!
//! A scenario either fixes the per contact transmission probability or treats
//! it as a random variable that varies between individuals. The latter models
//! superspreading: most infected persons transmit little, a few transmit a lot.
mod calibration;
mod constants;
mod infectiousness;

pub use calibration::*;
pub use constants::*;
pub use infectiousness::*;

use crate::error::{Result, RzeroError};
use crate::prelude::Real;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per contact transmission probability of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    /// Same probability for every infected person.
    Fixed(Real),
    /// Individual probabilities follow a Gamma distribution truncated to [0, 1].
    Gamma { mean: Real, overdispersion: Real },
}

impl Transmission {
    /// The fixed probability or the distribution mean.
    pub fn probability_or_mean(&self) -> Real {
        match *self {
            Transmission::Fixed(p) => p,
            Transmission::Gamma { mean, .. } => mean,
        }
    }

    /// Check that probabilities lie in [0, 1] and distributions are proper.
    pub fn validate(&self) -> Result<()> {
        let p = self.probability_or_mean();
        if !(0.0..=1.0).contains(&p) {
            return Err(RzeroError::config(format!(
                "transmission probability {} outside [0, 1]",
                p
            )));
        }
        if let Transmission::Gamma { mean, overdispersion } = *self {
            if mean > 0.0 {
                TruncatedGamma::new(mean, overdispersion)?;
            } else if !(overdispersion > 0.0) {
                return Err(RzeroError::config("overdispersion must be positive"));
            }
        }
        Ok(())
    }

    /// Draw the transmission probability of one infected individual.
    pub fn sample_individual<R: Rng>(&self, rng: &mut R) -> Result<Real> {
        match *self {
            Transmission::Fixed(p) => Ok(p),
            Transmission::Gamma { mean, .. } if mean == 0.0 => Ok(0.0),
            Transmission::Gamma { mean, overdispersion } => {
                Ok(TruncatedGamma::new(mean, overdispersion)?.sample(rng))
            }
        }
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transmission::Fixed(p) => write!(f, "p={}", p),
            Transmission::Gamma { mean, overdispersion } => {
                write!(f, "p~Gamma(mean={}, k={})", mean, overdispersion)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn validation() {
        assert!(Transmission::Fixed(0.05).validate().is_ok());
        assert!(Transmission::Fixed(1.5).validate().is_err());
        assert!(Transmission::Gamma { mean: 0.05, overdispersion: 0.4 }.validate().is_ok());
        assert!(Transmission::Gamma { mean: 0.05, overdispersion: -1.0 }.validate().is_err());
        assert!(Transmission::Gamma { mean: 0.0, overdispersion: 0.4 }.validate().is_ok());
    }

    #[test]
    fn zero_mean_draws_zero() {
        let mut rng = SmallRng::seed_from_u64(1);
        let t = Transmission::Gamma { mean: 0.0, overdispersion: 0.4 };
        assert_eq!(t.sample_individual(&mut rng).unwrap(), 0.0);
        assert_eq!(Transmission::Fixed(0.3).sample_individual(&mut rng).unwrap(), 0.3);
    }
}

use crate::error::{Result, RzeroError};
use crate::prelude::Real;
use getset::CopyGetters;
use serde::{Deserialize, Serialize};

/// Polynomial fit of R0 against the mean transmission probability,
/// `R0 = b0 + b1 * p + b2 * p^2`, obtained from earlier simulation runs.
///
/// Used to translate a target R0 into the transmission probability a run
/// should be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Default, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct TransmissionCalibration {
    b0: Real,
    b1: Real,
    #[serde(default)]
    b2: Real,
}

impl TransmissionCalibration {
    pub fn new(b0: Real, b1: Real, b2: Real) -> Self {
        TransmissionCalibration { b0, b1, b2 }
    }

    /// Expected R0 for a given transmission probability.
    pub fn r0(&self, p: Real) -> Real {
        self.b0 + self.b1 * p + self.b2 * p * p
    }

    /// Transmission probability that yields the target R0.
    pub fn probability_for_r0(&self, r0: Real) -> Result<Real> {
        let (a, b, c) = (self.b2, self.b1, self.b0 - r0);

        if a == 0.0 {
            if b == 0.0 {
                return Err(RzeroError::config("calibration with b1 = b2 = 0 cannot be inverted"));
            }
            return Ok(-c / b);
        }

        let determinant = b * b - 4.0 * a * c;
        if determinant < 0.0 {
            return Err(RzeroError::config(format!(
                "R0 = {} is not reachable with calibration {:?}",
                r0, self
            )));
        }
        Ok((-b + determinant.sqrt()) / (2.0 * a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn linear_fit() {
        let cal = TransmissionCalibration::new(0.5, 150.0, 0.0);
        assert_approx_eq!(cal.probability_for_r0(8.0).unwrap(), 0.05);
    }

    #[test]
    fn quadratic_fit_round_trips() {
        let cal = TransmissionCalibration::new(0.1, 160.0, -100.0);
        let p = cal.probability_for_r0(12.0).unwrap();
        assert_approx_eq!(cal.r0(p), 12.0, 1e-9);
        assert!(p > 0.0 && p < 0.2);
    }

    #[test]
    fn unreachable_r0_is_rejected() {
        // Maximum of this parabola is b0 - b1^2 / (4 b2) = 64.1
        let cal = TransmissionCalibration::new(0.1, 160.0, -100.0);
        assert!(cal.probability_for_r0(100.0).is_err());
        assert!(TransmissionCalibration::new(1.0, 0.0, 0.0).probability_for_r0(2.0).is_err());
    }
}

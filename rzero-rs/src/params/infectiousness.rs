use crate::error::{Result, RzeroError};
use crate::prelude::Real;
use crate::utils::special::{gamma_p, ln_gamma};
use getset::CopyGetters;
use rand::Rng;

const BISECTION_STEPS: usize = 100;

/// Cumulative probabilities at which integration breakpoints are placed.
const BREAKPOINT_LEVELS: [Real; 13] = [
    1e-6, 1e-3, 0.01, 0.05, 0.1, 0.25, 0.5, 0.75, 0.9, 0.95, 0.99, 0.999, 1.0 - 1e-6,
];

/// Gamma distribution of individual transmission probabilities, truncated to
/// [0, 1] and renormalised.
///
/// Shape is the overdispersion parameter and scale is `mean / overdispersion`,
/// so the untruncated mean equals `mean`. Small overdispersion puts most mass
/// near zero with a long tail (superspreaders).
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
pub struct TruncatedGamma {
    #[getset(get_copy = "pub")]
    shape: Real,
    #[getset(get_copy = "pub")]
    scale: Real,
    /// cdf(1) - cdf(0) of the untruncated distribution.
    #[getset(get_copy = "pub")]
    mass: Real,
    ln_norm: Real,
}

impl TruncatedGamma {
    pub fn new(mean: Real, overdispersion: Real) -> Result<Self> {
        if !(overdispersion.is_finite() && overdispersion > 0.0) {
            return Err(RzeroError::config(format!(
                "overdispersion must be positive, got {}",
                overdispersion
            )));
        }
        if !(mean.is_finite() && mean > 0.0) {
            return Err(RzeroError::config(format!(
                "mean transmission probability must be positive, got {}",
                mean
            )));
        }

        let shape = overdispersion;
        let scale = mean / shape;
        let mass = gamma_p(shape, 1.0 / scale);
        if mass <= 0.0 {
            return Err(RzeroError::config(format!(
                "Gamma(shape={}, scale={}) has no mass on [0, 1]",
                shape, scale
            )));
        }
        Ok(TruncatedGamma {
            shape,
            scale,
            mass,
            ln_norm: ln_gamma(shape) + shape * scale.ln() + mass.ln(),
        })
    }

    /// Density on the open interval (0, 1]; zero elsewhere.
    pub fn pdf(&self, x: Real) -> Real {
        if x <= 0.0 || x > 1.0 {
            return 0.0;
        }
        ((self.shape - 1.0) * x.ln() - x / self.scale - self.ln_norm).exp()
    }

    pub fn cdf(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        (gamma_p(self.shape, x / self.scale) / self.mass).clamp(0.0, 1.0)
    }

    /// Inverse of the truncated cdf, by bisection.
    pub fn quantile(&self, u: Real) -> Real {
        let u = u.clamp(0.0, 1.0);
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if self.cdf(mid) < u {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo < 1e-12 {
                break;
            }
        }
        return 0.5 * (lo + hi);
    }

    /// Increasing points of [0, 1] spread over the bulk of the mass, ends
    /// included. Integrating piecewise between them keeps narrow densities
    /// (large overdispersion) from slipping between quadrature nodes.
    pub fn breakpoints(&self) -> Vec<Real> {
        let mut points = vec![0.0];
        for &u in &BREAKPOINT_LEVELS {
            let x = self.quantile(u);
            if x > points[points.len() - 1] && x < 1.0 {
                points.push(x);
            }
        }
        points.push(1.0);
        return points;
    }

    /// Draw an individual transmission probability.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Real {
        self.quantile(rng.gen::<Real>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::quadrature::{integrate, integrate_with_breakpoints, MAX_SUBDIVISIONS};
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn density_integrates_to_one() {
        for &k in &[0.2, 0.4, 1.0, 5.0] {
            let g = TruncatedGamma::new(0.05, k).unwrap();
            let res = integrate(|x| Ok(g.pdf(x)), 0.0, 1.0, 1e-6, MAX_SUBDIVISIONS).unwrap();
            assert_approx_eq!(res.value(), 1.0, 1e-3);
        }
    }

    #[test]
    fn concentrated_density_integrates_to_one() {
        for &k in &[50.0, 100.0, 500.0] {
            let g = TruncatedGamma::new(0.05, k).unwrap();
            let points = g.breakpoints();
            assert!(points.windows(2).all(|w| w[0] < w[1]));
            assert_eq!((points[0], points[points.len() - 1]), (0.0, 1.0));
            let res = integrate_with_breakpoints(|x| Ok(g.pdf(x)), &points, 1e-6, MAX_SUBDIVISIONS).unwrap();
            assert_approx_eq!(res.value(), 1.0, 1e-3);
        }
    }

    #[test]
    fn quantile_inverts_cdf() {
        let g = TruncatedGamma::new(0.1, 0.4).unwrap();
        for &u in &[0.1, 0.5, 0.9, 0.99] {
            assert_approx_eq!(g.cdf(g.quantile(u)), u, 1e-8);
        }
    }

    #[test]
    fn samples_stay_in_unit_interval() {
        let g = TruncatedGamma::new(0.5, 0.4).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1000 {
            let x = g.sample(&mut rng);
            assert!((0.0..=1.0).contains(&x));
        }
    }

    #[test]
    fn invalid_parameters() {
        assert!(TruncatedGamma::new(0.05, 0.0).is_err());
        assert!(TruncatedGamma::new(0.0, 0.4).is_err());
        assert!(TruncatedGamma::new(Real::NAN, 0.4).is_err());
    }
}

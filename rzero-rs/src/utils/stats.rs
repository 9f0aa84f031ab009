use crate::error::{Result, RzeroError};
use crate::prelude::Real;
use getset::*;
use serde::{Deserialize, Serialize};

const INF: Real = Real::INFINITY;
const NAN: Real = Real::NAN;

/// Running summary statistics of a stream of reals.
pub trait Stats {
    fn add(&mut self, x: Real);
    fn add_many<I>(&mut self, xs: I)
    where
        I: IntoIterator<Item = Real>,
    {
        for x in xs {
            self.add(x);
        }
    }
    fn size(&self) -> usize;
    fn total(&self) -> Real;
    fn min(&self) -> Real;
    fn max(&self) -> Real;
    fn var(&self) -> Real;
    fn std(&self) -> Real {
        self.var().sqrt()
    }
    fn mean(&self) -> Real {
        self.total() / self.size() as Real
    }

    /// Mean that refuses to divide by zero.
    fn try_mean(&self) -> Result<Real> {
        if self.size() == 0 {
            return Err(RzeroError::empty("mean of zero observations"));
        }
        Ok(self.mean())
    }

    fn stats(&self) -> PointStats {
        PointStats {
            mean: self.mean(),
            std: self.std(),
            min: self.min(),
            max: self.max(),
            size: self.size(),
        }
    }

    /// Summary that refuses to describe an empty sample.
    fn try_stats(&self) -> Result<PointStats> {
        if self.size() == 0 {
            return Err(RzeroError::empty("statistics of zero observations"));
        }
        Ok(self.stats())
    }
}

/// Keeps every observation, so order statistics are available.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsVec {
    data: Vec<Real>,
}

impl StatsVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats_acc(&self) -> PointStatsAcc {
        let mut acc = PointStatsAcc::new();
        acc.add_many(self.data.iter().copied());
        return acc;
    }

    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }

    /// Linearly interpolated percentile, `q` in [0, 100]. NaN if empty.
    pub fn percentile(&self, q: Real) -> Real {
        if self.data.is_empty() {
            return NAN;
        }
        let mut sorted = self.data.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as Real;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frac = rank - lo as Real;
        return sorted[lo] + (sorted[hi] - sorted[lo]) * frac;
    }

    pub fn median(&self) -> Real {
        self.percentile(50.0)
    }
}

impl From<Vec<Real>> for StatsVec {
    fn from(data: Vec<Real>) -> Self {
        StatsVec { data }
    }
}

impl Stats for StatsVec {
    fn add(&mut self, x: Real) {
        self.data.push(x);
    }
    fn total(&self) -> Real {
        return self.data.iter().fold(0.0, |acc, x| acc + x);
    }
    fn var(&self) -> Real {
        self.stats_acc().var()
    }
    fn size(&self) -> usize {
        return self.data.len();
    }
    fn min(&self) -> Real {
        return self.data.iter().fold(INF, |acc, x| acc.min(*x));
    }
    fn max(&self) -> Real {
        return self.data.iter().fold(-INF, |acc, x| acc.max(*x));
    }
}

/// Constant memory accumulator of the first two moments.
#[derive(Debug, Copy, Clone, PartialEq, CopyGetters)]
pub struct PointStatsAcc {
    n: usize,
    m1: Real,
    m2: Real,
    min: Real,
    max: Real,
}

impl PointStatsAcc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Stats for PointStatsAcc {
    fn add(&mut self, x: Real) {
        self.n += 1;
        self.m1 += x;
        self.m2 += x * x;
        self.min = Real::min(x, self.min);
        self.max = Real::max(x, self.max);
    }

    fn mean(&self) -> Real {
        self.m1 / self.n as Real
    }

    fn total(&self) -> Real {
        return self.m1;
    }

    fn var(&self) -> Real {
        let m = self.mean();
        // Rounding may push a constant sample slightly below zero.
        return (self.m2 / self.n as Real - m * m).max(0.0);
    }

    fn min(&self) -> Real {
        self.min
    }
    fn max(&self) -> Real {
        self.max
    }
    fn size(&self) -> usize {
        self.n
    }
}

impl Default for PointStatsAcc {
    fn default() -> Self {
        PointStatsAcc {
            n: 0,
            m1: 0.,
            m2: 0.,
            min: INF,
            max: -INF,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, CopyGetters, Deserialize, Serialize)]
#[getset(get_copy = "pub")]
pub struct PointStats {
    mean: Real,
    std: Real,
    min: Real,
    max: Real,
    size: usize,
}

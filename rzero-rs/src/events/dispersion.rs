use super::record::SecondaryCaseRecord;
use crate::error::{Result, RzeroError};
use crate::params::P80_SHARE;
use crate::prelude::{Day, Real};
use crate::utils::StatsVec;
use getset::Getters;
use serde::{Deserialize, Serialize};

/// What the size of the P80 group is divided by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum P80Denominator {
    /// Total number of secondary cases of the run.
    TotalCases,
    /// Individuals with at least one secondary case.
    Infectors,
    /// All registered individuals.
    Individuals,
}

impl Default for P80Denominator {
    fn default() -> Self {
        P80Denominator::TotalCases
    }
}

impl SecondaryCaseRecord {
    /// Fraction of individuals responsible for 80% of the transmissions.
    ///
    /// `None` when the run has no transmissions.
    pub fn p80(&self, denominator: P80Denominator) -> Option<Real> {
        let total = self.total_secondary_cases();
        if total == 0 {
            return None;
        }

        let mut counts: Vec<u64> = self.secondary_cases_by_individual().values().copied().collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));

        let target = total as Real * P80_SHARE;
        let mut caused = 0;
        let mut responsible = 0;
        for c in counts {
            caused += c;
            responsible += 1;
            if caused as Real >= target {
                break;
            }
        }

        let denom = match denominator {
            P80Denominator::TotalCases => total as usize,
            P80Denominator::Infectors => self.infectors(),
            P80Denominator::Individuals => self.individuals(),
        };
        return Some(responsible as Real / denom as Real);
    }
}

/// P80 of every run whose total secondary case count exceeds `threshold`.
/// Extinct runs are skipped, not reported.
pub fn p80(runs: &[SecondaryCaseRecord], threshold: u64, denominator: P80Denominator) -> Vec<Real> {
    runs.iter()
        .filter(|run| run.total_secondary_cases() > threshold)
        .filter_map(|run| run.p80(denominator))
        .collect()
}

/// Fraction of runs with fewer than `threshold` secondary cases in total.
pub fn extinction_probability(runs: &[SecondaryCaseRecord], threshold: u64) -> Result<Real> {
    if runs.is_empty() {
        return Err(RzeroError::empty("extinction probability of zero runs"));
    }
    let extinct = runs
        .iter()
        .filter(|run| run.total_secondary_cases() < threshold)
        .count();
    return Ok(extinct as Real / runs.len() as Real);
}

/// Day by day distribution of Rt over the non-extinct runs of a scenario.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct RtBand {
    mean: Vec<Real>,
    median: Vec<Real>,
    /// 2.5th percentile.
    lower: Vec<Real>,
    /// 97.5th percentile.
    upper: Vec<Real>,
    /// Number of runs the band is computed from.
    runs: usize,
}

impl RtBand {
    /// Summarise `effective_r_by_day(num_days)` over the runs with more than
    /// `threshold` secondary cases.
    pub fn from_runs(runs: &[SecondaryCaseRecord], num_days: Day, threshold: u64) -> Result<Self> {
        let mut series = vec![];
        for run in runs.iter().filter(|r| r.total_secondary_cases() > threshold) {
            series.push(run.effective_r_by_day(num_days)?);
        }
        if series.is_empty() {
            return Err(RzeroError::empty(format!(
                "no run with more than {} secondary cases",
                threshold
            )));
        }

        let mut band = RtBand {
            mean: Vec::with_capacity(num_days as usize),
            median: Vec::with_capacity(num_days as usize),
            lower: Vec::with_capacity(num_days as usize),
            upper: Vec::with_capacity(num_days as usize),
            runs: series.len(),
        };
        for day in 0..num_days as usize {
            let values = StatsVec::from(series.iter().map(|s| s[day]).collect::<Vec<_>>());
            band.mean.push(values.as_slice().iter().sum::<Real>() / series.len() as Real);
            band.median.push(values.median());
            band.lower.push(values.percentile(2.5));
            band.upper.push(values.percentile(97.5));
        }
        return Ok(band);
    }

    pub fn num_days(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventRecord;
    use crate::prelude::Id;
    use assert_approx_eq::assert_approx_eq;

    /// A run where `infector` i (1-based) caused `counts[i - 1]` infections
    /// on day 1.
    fn run(counts: &[u64]) -> SecondaryCaseRecord {
        let mut events = vec![EventRecord::Primary {
            infected: 1,
            day: 0,
            p: 0.1,
        }];
        let mut next: Id = 1000;
        for (i, &c) in counts.iter().enumerate() {
            for _ in 0..c {
                events.push(EventRecord::Transmission {
                    infected: next,
                    infector: i as Id + 1,
                    day: 1,
                    p: 0.1,
                });
                next += 1;
            }
        }
        SecondaryCaseRecord::from_events(events)
    }

    #[test]
    fn p80_of_skewed_run() {
        // 10 transmissions: 8 by a single infector.
        let r = run(&[8, 1, 1]);
        assert_approx_eq!(r.p80(P80Denominator::TotalCases).unwrap(), 0.1);
        assert_approx_eq!(r.p80(P80Denominator::Infectors).unwrap(), 1.0 / 3.0);
        // Individuals: 3 infectors plus 10 infected.
        assert_approx_eq!(r.p80(P80Denominator::Individuals).unwrap(), 1.0 / 13.0);
    }

    #[test]
    fn p80_skips_extinct_runs() {
        let runs = vec![run(&[8, 1, 1]), run(&[2]), run(&[5, 5, 5, 5])];
        let values = p80(&runs, 5, P80Denominator::TotalCases);
        assert_eq!(values.len(), 2);
        assert_approx_eq!(values[1], 4.0 / 20.0);
        for denom in [
            P80Denominator::TotalCases,
            P80Denominator::Infectors,
            P80Denominator::Individuals,
        ] {
            for v in p80(&runs, 0, denom) {
                assert!(v > 0.0 && v <= 1.0);
            }
        }
        assert_eq!(run(&[]).p80(P80Denominator::TotalCases), None);
    }

    #[test]
    fn extinction() {
        let runs = vec![run(&[8, 1, 1]), run(&[2]), run(&[5, 5, 5, 5]), run(&[])];
        assert_approx_eq!(extinction_probability(&runs, 10).unwrap(), 0.5);
        assert_approx_eq!(extinction_probability(&runs, 0).unwrap(), 0.0);
        assert!(extinction_probability(&[], 10).is_err());
    }

    #[test]
    fn rt_band() {
        let runs = vec![run(&[4]), run(&[2]), run(&[1])];
        let band = RtBand::from_runs(&runs, 3, 1).unwrap();
        assert_eq!(*band.runs(), 2);
        assert_eq!(band.num_days(), 3);
        // Day 0 only has the primary case, which infected 4 or 2 people.
        assert_approx_eq!(band.mean()[0], 3.0);
        assert_approx_eq!(band.median()[0], 3.0);
        assert_approx_eq!(band.lower()[0], 2.05);
        assert_approx_eq!(band.upper()[0], 3.95);
        assert_approx_eq!(band.mean()[1], 0.0);

        assert!(RtBand::from_runs(&runs, 3, 10).is_err());
        assert!(matches!(RtBand::from_runs(&runs, 1, 1), Err(RzeroError::OutOfRange(_))));
    }
}

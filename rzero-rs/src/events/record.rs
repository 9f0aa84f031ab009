use super::parser::EventRecord;
use crate::error::{Result, RzeroError};
use crate::prelude::{Day, Id, Real};
use crate::utils::{PointStatsAcc, Stats};
use getset::Getters;
use log::warn;
use std::collections::BTreeMap;

/// Infector -> infected graph of a single simulation run, reduced to what the
/// post-processing needs.
///
/// Every individual that appears as infected is registered with zero
/// secondary cases. Infectors are registered lazily, so an infector missing
/// from the log still counts its transmissions.
#[derive(Debug, Clone, PartialEq, Default, Getters)]
pub struct SecondaryCaseRecord {
    counts: BTreeMap<Id, u64>,
    /// Individuals infected on each day, primary cases included.
    #[getset(get = "pub")]
    infected_by_day: BTreeMap<Day, Vec<Id>>,
    /// Number of `[TRAN]` events on each day.
    #[getset(get = "pub")]
    transmissions_by_day: BTreeMap<Day, u64>,
    #[getset(get = "pub")]
    primary_cases: Vec<Id>,
    /// Transmission probability of every event, in log order.
    #[getset(get = "pub")]
    probabilities: Vec<Real>,
}

impl SecondaryCaseRecord {
    /// Replay events in order.
    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = EventRecord>,
    {
        let mut record = SecondaryCaseRecord::default();
        for event in events {
            record.register(event);
        }
        if record.primary_cases.len() > 1 {
            warn!(
                "event log has {} primary cases: {:?}",
                record.primary_cases.len(),
                record.primary_cases
            );
        }
        return record;
    }

    /// Replay only the events that happened before `horizon`.
    pub fn reconstruct_until<I>(events: I, horizon: Day) -> Self
    where
        I: IntoIterator<Item = EventRecord>,
    {
        Self::from_events(events.into_iter().filter(|e| e.day() < horizon))
    }

    fn register(&mut self, event: EventRecord) {
        let infected = event.infected();
        let day = event.day();
        self.counts.entry(infected).or_insert(0);
        self.infected_by_day.entry(day).or_insert_with(Vec::new).push(infected);
        self.probabilities.push(event.probability());

        match event {
            EventRecord::Primary { .. } => self.primary_cases.push(infected),
            EventRecord::Transmission { infector, .. } => {
                *self.counts.entry(infector).or_insert(0) += 1;
                *self.transmissions_by_day.entry(day).or_insert(0) += 1;
            }
        }
    }

    /// Secondary case count of every registered individual, by id.
    pub fn secondary_cases_by_individual(&self) -> &BTreeMap<Id, u64> {
        &self.counts
    }

    pub fn secondary_cases(&self, id: Id) -> Option<u64> {
        self.counts.get(&id).copied()
    }

    /// Number of registered individuals.
    pub fn individuals(&self) -> usize {
        self.counts.len()
    }

    /// Number of individuals with at least one secondary case.
    pub fn infectors(&self) -> usize {
        self.counts.values().filter(|&&c| c > 0).count()
    }

    /// Total number of transmissions, i.e. the outbreak size without the
    /// primary cases.
    pub fn total_secondary_cases(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Last day with an event, if any.
    pub fn last_day(&self) -> Option<Day> {
        self.infected_by_day.keys().next_back().copied()
    }

    /// Mean number of secondary cases of the individuals infected on `day`.
    /// Zero when nobody was infected that day.
    pub fn effective_r(&self, day: Day) -> Real {
        let infected = match self.infected_by_day.get(&day) {
            Some(ids) if !ids.is_empty() => ids,
            _ => return 0.0,
        };
        let total: u64 = infected.iter().map(|id| self.counts.get(id).copied().unwrap_or(0)).sum();
        return total as Real / infected.len() as Real;
    }

    /// Effective reproduction number for days `0..num_days`.
    pub fn effective_r_by_day(&self, num_days: Day) -> Result<Vec<Real>> {
        self.check_horizon(num_days)?;
        Ok((0..num_days).map(|day| self.effective_r(day)).collect())
    }

    /// Number of transmissions on each of the days `0..num_days`.
    pub fn new_cases_per_day(&self, num_days: Day) -> Result<Vec<u64>> {
        self.check_horizon(num_days)?;
        Ok((0..num_days)
            .map(|day| self.transmissions_by_day.get(&day).copied().unwrap_or(0))
            .collect())
    }

    fn check_horizon(&self, num_days: Day) -> Result<()> {
        match self.last_day() {
            Some(day) if day >= num_days => Err(RzeroError::out_of_range(format!(
                "event on day {} beyond the {} simulated days",
                day, num_days
            ))),
            _ => Ok(()),
        }
    }

    /// Mean secondary cases over all registered individuals.
    pub fn mean_secondary_cases(&self) -> Result<Real> {
        let mut acc = PointStatsAcc::new();
        acc.add_many(self.counts.values().map(|&c| c as Real));
        acc.try_mean()
    }

    /// Mean secondary cases of the primary cases.
    pub fn secondary_cases_per_index_case(&self) -> Result<Real> {
        let mut acc = PointStatsAcc::new();
        acc.add_many(
            self.primary_cases
                .iter()
                .map(|id| self.counts.get(id).copied().unwrap_or(0) as Real),
        );
        acc.try_mean()
    }

    /// Mean transmission probability over all events of the run.
    pub fn mean_transmission_probability(&self) -> Result<Real> {
        let mut acc = PointStatsAcc::new();
        acc.add_many(self.probabilities.iter().copied());
        acc.try_mean()
    }

    /// Number of individuals with each secondary case count, as a percentage
    /// of the total number of transmissions. Empty if nobody transmitted.
    pub fn secondary_case_frequencies(&self) -> BTreeMap<u64, Real> {
        let total = self.total_secondary_cases();
        let mut freqs = BTreeMap::new();
        if total == 0 {
            return freqs;
        }
        for &c in self.counts.values() {
            *freqs.entry(c).or_insert(0.0) += 1.0;
        }
        for v in freqs.values_mut() {
            *v *= 100.0 / total as Real;
        }
        return freqs;
    }
}

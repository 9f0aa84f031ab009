//! Expected number of secondary cases of a single person.
//!
//! A person infects members of the pools it belongs to. For each other member
//! the survey contact rates give a daily contact probability `c`; with a per
//! contact transmission probability `p` and an infectious period of `d` days,
//! the member is infected with probability `1 - (1 - p c)^d`. Summing over
//! members and pools and averaging over the candidate period lengths gives the
//! expected number of secondary cases in a fully susceptible population.
use crate::contact::ContactRateModel;
use crate::error::{Result, RzeroError};
use crate::params::{Transmission, TruncatedGamma, QUADRATURE_TOLERANCE};
use crate::pop::{Member, Person, PoolType, PopulationIndex};
use crate::prelude::{Age, Day, Real, MAX_CONTACT_PROBABILITY};
use crate::utils::quadrature::{integrate_with_breakpoints, MAX_SUBDIVISIONS};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a survey contact rate is turned into a per pair contact probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactNormalization {
    /// Divide by the number of other pool members.
    PoolSize,
    /// Divide by the number of other pool members of the contacted age.
    SameAgePeers,
}

impl Default for ContactNormalization {
    fn default() -> Self {
        ContactNormalization::PoolSize
    }
}

/// Computes expected secondary cases from pool structure and contact rates.
///
/// The estimator only borrows the population and the contact model, so one
/// instance can be shared by every worker of a pool.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct EffectiveContactEstimator<'a> {
    #[getset(get_copy = "pub")]
    population: &'a PopulationIndex,
    #[getset(get_copy = "pub")]
    contacts: &'a ContactRateModel,
    #[getset(get = "pub")]
    infectious_period_lengths: Vec<Day>,
    #[getset(get_copy = "pub")]
    normalization: ContactNormalization,
    #[getset(get_copy = "pub")]
    tolerance: Real,
}

impl<'a> EffectiveContactEstimator<'a> {
    pub fn new(
        population: &'a PopulationIndex,
        contacts: &'a ContactRateModel,
        infectious_period_lengths: Vec<Day>,
    ) -> Result<Self> {
        if infectious_period_lengths.is_empty() {
            return Err(RzeroError::config("no infectious period lengths given"));
        }
        if infectious_period_lengths.contains(&0) {
            return Err(RzeroError::config("infectious period lengths must be positive"));
        }
        Ok(EffectiveContactEstimator {
            population,
            contacts,
            infectious_period_lengths,
            normalization: ContactNormalization::default(),
            tolerance: QUADRATURE_TOLERANCE,
        })
    }

    pub fn with_normalization(mut self, normalization: ContactNormalization) -> Self {
        self.normalization = normalization;
        return self;
    }

    /// Absolute error tolerance of the integral over individual infectiousness.
    pub fn with_tolerance(mut self, tolerance: Real) -> Self {
        self.tolerance = tolerance;
        return self;
    }

    /// Probability that `person` meets `member` on a given day.
    ///
    /// Always lies in [0, 0.999]. Household members are always in contact.
    pub fn contact_probability(
        &self,
        pool_type: PoolType,
        person: &Member,
        member: &Member,
        pool: &[Member],
    ) -> Result<Real> {
        let (n1, n2) = match self.normalization {
            ContactNormalization::PoolSize => {
                let n = pool.len().saturating_sub(1);
                (n, n)
            }
            ContactNormalization::SameAgePeers => (
                pool.iter()
                    .filter(|m| m.id != person.id && m.age == member.age)
                    .count(),
                pool.iter()
                    .filter(|m| m.id != member.id && m.age == person.age)
                    .count(),
            ),
        };
        self.normalized_probability(pool_type, person, member, n1, n2)
    }

    /// `n1` is the number of peers sharing the age of `member` as seen by
    /// `person`, `n2` the converse.
    fn normalized_probability(
        &self,
        pool_type: PoolType,
        person: &Member,
        member: &Member,
        n1: usize,
        n2: usize,
    ) -> Result<Real> {
        let r1 = self.contacts.rate(pool_type, person.age, member.age)?;
        let r2 = self.contacts.rate(pool_type, member.age, person.age)?;

        if pool_type == PoolType::Household {
            return Ok(MAX_CONTACT_PROBABILITY);
        }
        if n1 == 0 || n2 == 0 {
            return Ok(0.0);
        }

        let c = Real::min(r1 / n1 as Real, r2 / n2 as Real);
        if c >= 1.0 {
            return Ok(MAX_CONTACT_PROBABILITY);
        }
        Ok(c.max(0.0))
    }

    /// Contact probability of `person` with every other member of its pool of
    /// the given type, in pool order. Empty if the person has no such pool.
    pub fn pool_contact_probabilities(&self, person: &Person, pool_type: PoolType) -> Result<Vec<Real>> {
        let pool_id = person.pool_id(pool_type);
        if pool_id <= 0 {
            return Ok(vec![]);
        }
        let pool = self.population.members(pool_type, pool_id);
        let me = Member {
            id: person.id(),
            age: person.age(),
        };

        let mut ages: HashMap<Age, usize> = HashMap::new();
        if self.normalization == ContactNormalization::SameAgePeers {
            for m in pool {
                *ages.entry(m.age).or_insert(0) += 1;
            }
        }
        let peers = |age: Age, excluded: Age| {
            let n = ages.get(&age).copied().unwrap_or(0);
            if age == excluded {
                n.saturating_sub(1)
            } else {
                n
            }
        };

        let others = pool.len().saturating_sub(1);
        let mut probabilities = Vec::with_capacity(others);
        for member in pool.iter().filter(|m| m.id != me.id) {
            let (n1, n2) = match self.normalization {
                ContactNormalization::PoolSize => (others, others),
                ContactNormalization::SameAgePeers => (peers(member.age, me.age), peers(me.age, member.age)),
            };
            probabilities.push(self.normalized_probability(pool_type, &me, member, n1, n2)?);
        }
        return Ok(probabilities);
    }

    /// Contact probabilities of `person` over all its pools.
    pub fn contact_probabilities(&self, person: &Person) -> Result<Vec<Real>> {
        let mut probabilities = vec![];
        for (pool_type, _) in person.pools() {
            probabilities.extend(self.pool_contact_probabilities(person, pool_type)?);
        }
        return Ok(probabilities);
    }

    /// Sum of `1 - (1 - p c)^d` over the contact probabilities, averaged over
    /// the infectious period lengths.
    fn secondary_cases_from(&self, probabilities: &[Real], p: Real) -> Real {
        let mut total = 0.0;
        for &d in &self.infectious_period_lengths {
            for c in probabilities {
                total += 1.0 - (1.0 - p * c).powi(d as i32);
            }
        }
        return total / self.infectious_period_lengths.len() as Real;
    }

    /// Expected secondary cases caused in a single pool type, averaged over
    /// the infectious period lengths.
    pub fn pool_contribution(&self, person: &Person, pool_type: PoolType, p: Real) -> Result<Real> {
        let probabilities = self.pool_contact_probabilities(person, pool_type)?;
        Ok(self.secondary_cases_from(&probabilities, p))
    }

    /// Expected secondary cases of `person` for a fixed transmission
    /// probability `p`.
    pub fn expected_secondary_cases(&self, person: &Person, p: Real) -> Result<Real> {
        let probabilities = self.contact_probabilities(person)?;
        Ok(self.secondary_cases_from(&probabilities, p))
    }

    /// Expected number of effective contacts over the infectious period, i.e.
    /// secondary cases if every contact transmitted.
    pub fn effective_contacts(&self, person: &Person) -> Result<Real> {
        self.expected_secondary_cases(person, 1.0)
    }

    /// Expected secondary cases when individual transmission probabilities
    /// follow a truncated Gamma distribution.
    pub fn expected_secondary_cases_heterogeneous(
        &self,
        person: &Person,
        mean: Real,
        overdispersion: Real,
    ) -> Result<Real> {
        let probabilities = self.contact_probabilities(person)?;
        if mean == 0.0 || probabilities.is_empty() {
            return Ok(self.secondary_cases_from(&probabilities, 0.0));
        }
        let density = TruncatedGamma::new(mean, overdispersion)?;
        let integral = integrate_with_breakpoints(
            |x| Ok(self.secondary_cases_from(&probabilities, x) * density.pdf(x)),
            &density.breakpoints(),
            self.tolerance,
            MAX_SUBDIVISIONS,
        )?;
        return Ok(integral.value().max(0.0));
    }

    /// Expected secondary cases of `person` under a scenario transmission.
    pub fn estimate(&self, person: &Person, transmission: &Transmission) -> Result<Real> {
        match *transmission {
            Transmission::Fixed(p) => self.expected_secondary_cases(person, p),
            Transmission::Gamma { mean, overdispersion } => {
                self.expected_secondary_cases_heterogeneous(person, mean, overdispersion)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{ContactMatrixKind, PoolRates};
    use assert_approx_eq::assert_approx_eq;

    fn uniform_model(rate: Real) -> ContactRateModel {
        let mut model = ContactRateModel::new();
        for pt in PoolType::ALL {
            let obs = (0..=crate::MAX_AGE).flat_map(|a| (0..=crate::MAX_AGE).map(move |b| (a, b, rate)));
            model.insert(pt, PoolRates::directional(obs).unwrap());
        }
        return model;
    }

    fn household_trio() -> PopulationIndex {
        PopulationIndex::from_rows(vec![
            (30, [1, 0, 0, 0, 0]),
            (31, [1, 0, 0, 0, 0]),
            (32, [1, 0, 0, 0, 0]),
        ])
    }

    #[test]
    fn household_trio_example() {
        let pop = household_trio();
        let model = uniform_model(2.0);
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6, 7]).unwrap();
        let person = pop.person(1).unwrap();
        let r = est.expected_secondary_cases(person, 0.05).unwrap();
        let pair = 0.5 * ((1.0 - (1.0 - 0.05 * 0.999 as Real).powi(6)) + (1.0 - (1.0 - 0.05 * 0.999 as Real).powi(7)));
        assert_approx_eq!(pair, 0.283, 1e-3);
        assert_approx_eq!(r, 2.0 * pair, 1e-12);
        assert_approx_eq!(r, 0.566, 1e-2);
    }

    #[test]
    fn household_contact_is_always_certain() {
        let pop = household_trio();
        for rate in [0.0, 0.3, 5.0] {
            let model = uniform_model(rate);
            let est = EffectiveContactEstimator::new(&pop, &model, vec![6]).unwrap();
            let pool = pop.members(PoolType::Household, 1);
            let c = est
                .contact_probability(PoolType::Household, &pool[0], &pool[1], pool)
                .unwrap();
            assert_eq!(c, MAX_CONTACT_PROBABILITY);
        }
    }

    #[test]
    fn contact_probability_is_clamped_and_symmetric_minimum() {
        let pop = PopulationIndex::from_rows(vec![(20, [0, 1, 0, 0, 0]), (40, [0, 1, 0, 0, 0])]);
        let mut model = ContactRateModel::new();
        model.insert(
            PoolType::Work,
            PoolRates::directional(vec![(20, 40, 3.0), (40, 20, 0.25), (40, 40, 0.0)]).unwrap(),
        );
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6]).unwrap();
        let pool = pop.members(PoolType::Work, 1);
        let c = est.contact_probability(PoolType::Work, &pool[0], &pool[1], pool).unwrap();
        assert_approx_eq!(c, 0.25);

        let mut model = ContactRateModel::new();
        model.insert(PoolType::Work, PoolRates::aggregated(vec![(20, 4.0), (40, 3.0)]).unwrap());
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6]).unwrap();
        let c = est.contact_probability(PoolType::Work, &pool[0], &pool[1], pool).unwrap();
        assert_eq!(c, MAX_CONTACT_PROBABILITY);
    }

    #[test]
    fn contact_probabilities_stay_in_range() {
        let pop = PopulationIndex::from_rows((0..20).map(|i| (i * 5, [0, 1, 1, 1, 1])));
        for rate in [0.0, 0.01, 0.7, 3.0, 40.0] {
            let model = uniform_model(rate);
            for norm in [ContactNormalization::PoolSize, ContactNormalization::SameAgePeers] {
                let est = EffectiveContactEstimator::new(&pop, &model, vec![6])
                    .unwrap()
                    .with_normalization(norm);
                for pt in [PoolType::Work, PoolType::School, PoolType::PrimaryCommunity] {
                    let pool = pop.members(pt, 1);
                    for a in pool {
                        for b in pool.iter().filter(|m| m.id != a.id) {
                            let c = est.contact_probability(pt, a, b, pool).unwrap();
                            assert!((0.0..=MAX_CONTACT_PROBABILITY).contains(&c));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn same_age_normalization_counts_peers() {
        // Person aged 20 with two 40 year olds: rate 1.0 is spread over two
        // peers of age 40; the 40 year olds each see a single 20 year old.
        let pop = PopulationIndex::from_rows(vec![
            (20, [0, 1, 0, 0, 0]),
            (40, [0, 1, 0, 0, 0]),
            (40, [0, 1, 0, 0, 0]),
        ]);
        let mut model = ContactRateModel::new();
        model.insert(
            PoolType::Work,
            PoolRates::directional(vec![(20, 40, 1.0), (40, 20, 0.8), (40, 40, 0.0)]).unwrap(),
        );
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6])
            .unwrap()
            .with_normalization(ContactNormalization::SameAgePeers);
        let pool = pop.members(PoolType::Work, 1);
        let c = est.contact_probability(PoolType::Work, &pool[0], &pool[1], pool).unwrap();
        assert_approx_eq!(c, 0.5);

        let est = est.with_normalization(ContactNormalization::PoolSize);
        let c = est.contact_probability(PoolType::Work, &pool[0], &pool[1], pool).unwrap();
        assert_approx_eq!(c, 0.4);
    }

    #[test]
    fn isolated_persons_cause_nothing() {
        let pop = PopulationIndex::from_rows(vec![(30, [0, 0, -1, 0, 0]), (50, [9, 0, 0, 0, 0])]);
        let model = uniform_model(1.0);
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6, 7]).unwrap();
        assert_eq!(est.expected_secondary_cases(pop.person(1).unwrap(), 0.5).unwrap(), 0.0);
        // Alone in its household.
        assert_eq!(est.expected_secondary_cases(pop.person(2).unwrap(), 0.5).unwrap(), 0.0);
        let gamma = Transmission::Gamma { mean: 0.1, overdispersion: 0.4 };
        assert_eq!(est.estimate(pop.person(1).unwrap(), &gamma).unwrap(), 0.0);
    }

    #[test]
    fn non_decreasing_in_transmission_probability() {
        let pop = PopulationIndex::from_rows((0..12).map(|i| (10 + i * 3, [1 + i as i64 % 3, 1, 0, 1, 2])));
        let model = uniform_model(0.8);
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6, 7, 8, 9]).unwrap();
        let person = pop.person(4).unwrap();
        let mut last = 0.0;
        for i in 0..=20 {
            let r = est.expected_secondary_cases(person, i as Real * 0.05).unwrap();
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn missing_pool_type_data_fails() {
        let pop = PopulationIndex::from_rows(vec![(30, [0, 1, 0, 0, 0]), (31, [0, 1, 0, 0, 0])]);
        let model = ContactRateModel::from_xml_str(
            "<m><household><participant><age>1</age><contacts><contact><age>1</age><rate>1</rate></contact></contacts></participant></household></m>",
            ContactMatrixKind::Directional,
        )
        .unwrap();
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6]).unwrap();
        let res = est.expected_secondary_cases(pop.person(1).unwrap(), 0.1);
        assert!(matches!(res, Err(RzeroError::Configuration(_))));
    }

    #[test]
    fn heterogeneous_estimate_approaches_point_estimate() {
        let pop = household_trio();
        let model = uniform_model(2.0);
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6, 7])
            .unwrap()
            .with_tolerance(1e-8);
        let person = pop.person(1).unwrap();
        let point = est.expected_secondary_cases(person, 0.05).unwrap();

        let concentrated = est
            .expected_secondary_cases_heterogeneous(person, 0.05, 500.0)
            .unwrap();
        assert_approx_eq!(concentrated, point, 5e-3);

        // Expected secondary cases is concave in p, so spreading infectiousness
        // can only lower the estimate.
        let dispersed = est
            .expected_secondary_cases_heterogeneous(person, 0.05, 0.4)
            .unwrap();
        assert!(dispersed < point);
        assert!(dispersed > 0.0);
    }

    #[test]
    fn concentrated_gamma_at_default_tolerance() {
        let pop = household_trio();
        let model = uniform_model(2.0);
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6, 7]).unwrap();
        let person = pop.person(1).unwrap();
        let point = est.expected_secondary_cases(person, 0.05).unwrap();
        assert_approx_eq!(point, 0.5661, 1e-3);
        for k in [100.0, 500.0] {
            let r = est.expected_secondary_cases_heterogeneous(person, 0.05, k).unwrap();
            assert_approx_eq!(r, point, 5e-3);
        }
    }

    #[test]
    fn pool_probabilities_match_pairwise() {
        let pop = PopulationIndex::from_rows(
            [20, 20, 40, 40, 40, 60, 20, 60].into_iter().map(|age| (age, [0, 1, 0, 0, 1])),
        );
        let mut model = ContactRateModel::new();
        for pt in [PoolType::Work, PoolType::SecondaryCommunity] {
            let obs = [20, 40, 60].into_iter().flat_map(|a| [20, 40, 60].into_iter().map(move |b| (a, b, (a + b) as Real / 40.0)));
            model.insert(pt, PoolRates::directional(obs).unwrap());
        }
        for norm in [ContactNormalization::PoolSize, ContactNormalization::SameAgePeers] {
            let est = EffectiveContactEstimator::new(&pop, &model, vec![6])
                .unwrap()
                .with_normalization(norm);
            let pool = pop.members(PoolType::Work, 1);
            for person in pop.persons() {
                let me = Member {
                    id: person.id(),
                    age: person.age(),
                };
                let pairwise: Vec<Real> = pool
                    .iter()
                    .filter(|m| m.id != me.id)
                    .map(|m| est.contact_probability(PoolType::Work, &me, m, pool).unwrap())
                    .collect();
                let batch = est.pool_contact_probabilities(person, PoolType::Work).unwrap();
                assert_eq!(batch, pairwise);
                assert_eq!(est.contact_probabilities(person).unwrap().len(), 14);
            }
        }
    }

    #[test]
    fn effective_contacts_of_household_trio() {
        let pop = household_trio();
        let model = uniform_model(2.0);
        let est = EffectiveContactEstimator::new(&pop, &model, vec![6]).unwrap();
        let contacts = est.effective_contacts(pop.person(2).unwrap()).unwrap();
        assert_approx_eq!(contacts, 2.0 * (1.0 - (1.0 - MAX_CONTACT_PROBABILITY).powi(6)), 1e-12);
    }

    #[test]
    fn invalid_period_lengths() {
        let pop = household_trio();
        let model = uniform_model(1.0);
        assert!(EffectiveContactEstimator::new(&pop, &model, vec![]).is_err());
        assert!(EffectiveContactEstimator::new(&pop, &model, vec![6, 0]).is_err());
    }
}

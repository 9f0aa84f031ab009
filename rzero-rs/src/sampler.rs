use crate::{
    contact::ContactRateModel,
    error::{Result, RzeroError},
    estimator::{ContactNormalization, EffectiveContactEstimator},
    parallel::ParallelMap,
    params::{Transmission, INFECTIOUS_PERIOD_LENGTHS, QUADRATURE_TOLERANCE},
    pop::{Person, PopulationIndex},
    prelude::{Age, Day, Id, Real},
    utils::{PointStats, PointStatsAcc, Stats},
};
use getset::*;
use log::{debug, error, info};
use rand::{rngs::SmallRng, seq::index, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A transmission setting together with the candidate infectious period
/// lengths, each weighted equally.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct Scenario {
    transmission: Transmission,
    infectious_period_lengths: Vec<Day>,
}

impl Scenario {
    pub fn new(transmission: Transmission, infectious_period_lengths: Vec<Day>) -> Self {
        Scenario {
            transmission,
            infectious_period_lengths,
        }
    }

    /// Scenario with a fixed transmission probability and the default
    /// infectious period lengths.
    pub fn fixed(p: Real) -> Self {
        Scenario::new(Transmission::Fixed(p), INFECTIOUS_PERIOD_LENGTHS.to_vec())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, d={:?}", self.transmission, self.infectious_period_lengths)
    }
}

/// Which persons of the population are evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonSelection {
    All,
    /// The first `n` persons in input order.
    Capped(usize),
    /// A uniform sample without replacement, reproducible from `seed`.
    Random { size: usize, seed: u64 },
    /// Positions in input order, 0-based.
    Explicit(Vec<usize>),
}

impl Default for PersonSelection {
    fn default() -> Self {
        PersonSelection::All
    }
}

impl PersonSelection {
    /// Resolve the selection against a population. Random samples are
    /// returned in input order.
    pub fn resolve<'p>(&self, population: &'p PopulationIndex) -> Result<Vec<&'p Person>> {
        let persons = population.persons();
        let selected: Vec<&Person> = match self {
            PersonSelection::All => persons.iter().collect(),
            PersonSelection::Capped(n) => persons.iter().take(*n).collect(),
            PersonSelection::Random { size, seed } => {
                let mut rng = SmallRng::seed_from_u64(*seed);
                let amount = (*size).min(persons.len());
                let mut positions = index::sample(&mut rng, persons.len(), amount).into_vec();
                positions.sort_unstable();
                positions.into_iter().map(|i| &persons[i]).collect()
            }
            PersonSelection::Explicit(positions) => {
                let mut out = Vec::with_capacity(positions.len());
                for &i in positions {
                    let person = population.get(i).ok_or_else(|| {
                        RzeroError::out_of_range(format!(
                            "person index {} outside population of {}",
                            i,
                            persons.len()
                        ))
                    })?;
                    out.push(person);
                }
                out
            }
        };

        if selected.is_empty() {
            return Err(RzeroError::empty(format!("selection {:?} contains no person", self)));
        }
        return Ok(selected);
    }
}

/// How per person results are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Mean,
    Distribution,
}

impl Default for Aggregate {
    fn default() -> Self {
        Aggregate::Mean
    }
}

/// Expected secondary cases of a single person.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonEstimate {
    pub id: Id,
    pub age: Age,
    pub r: Real,
}

/// Result of a successful scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioEstimate {
    /// Summary statistics over the selected persons.
    Mean(PointStats),
    /// One entry per selected person, in selection order.
    Distribution(Vec<PersonEstimate>),
}

impl ScenarioEstimate {
    /// Mean expected secondary cases, whichever form was requested.
    pub fn mean(&self) -> Real {
        match self {
            ScenarioEstimate::Mean(stats) => stats.mean(),
            ScenarioEstimate::Distribution(values) => {
                let mut acc = PointStatsAcc::new();
                acc.add_many(values.iter().map(|e| e.r));
                acc.mean()
            }
        }
    }
}

/// Scenario together with its result. Failed scenarios are kept.
#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct ScenarioOutcome {
    scenario: Scenario,
    result: Result<ScenarioEstimate>,
}

impl ScenarioOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<ScenarioEstimate> {
        self.result
    }
}

/// Evaluates the expected number of secondary cases of many persons under
/// many scenarios.
///
/// Each (person, scenario) pair is an independent task handed to the
/// executor. The population and the contact model are shared read only by
/// all tasks.
#[derive(Debug, Getters, CopyGetters)]
pub struct ReproductionNumberSampler<'a, P: ParallelMap> {
    #[getset(get_copy = "pub")]
    population: &'a PopulationIndex,
    #[getset(get_copy = "pub")]
    contacts: &'a ContactRateModel,
    #[getset(get_copy = "pub")]
    normalization: ContactNormalization,
    #[getset(get_copy = "pub")]
    tolerance: Real,
    /// Report effective contacts instead of secondary cases; the scenario
    /// transmission is then ignored.
    #[getset(get_copy = "pub")]
    contacts_only: bool,
    #[getset(get = "pub")]
    executor: P,
}

impl<'a, P: ParallelMap> ReproductionNumberSampler<'a, P> {
    pub fn new(population: &'a PopulationIndex, contacts: &'a ContactRateModel, executor: P) -> Self {
        ReproductionNumberSampler {
            population,
            contacts,
            normalization: ContactNormalization::default(),
            tolerance: QUADRATURE_TOLERANCE,
            contacts_only: false,
            executor,
        }
    }

    pub fn with_normalization(mut self, normalization: ContactNormalization) -> Self {
        self.normalization = normalization;
        return self;
    }

    pub fn with_tolerance(mut self, tolerance: Real) -> Self {
        self.tolerance = tolerance;
        return self;
    }

    pub fn with_contacts_only(mut self, contacts_only: bool) -> Self {
        self.contacts_only = contacts_only;
        return self;
    }

    fn estimator(&self, scenario: &Scenario) -> Result<EffectiveContactEstimator<'a>> {
        scenario.transmission().validate()?;
        let estimator = EffectiveContactEstimator::new(
            self.population,
            self.contacts,
            scenario.infectious_period_lengths().clone(),
        )?;
        Ok(estimator
            .with_normalization(self.normalization)
            .with_tolerance(self.tolerance))
    }

    /// Evaluate every scenario over the selected persons.
    ///
    /// Fails only if the selection itself is invalid. A person failing within
    /// a scenario fails that scenario; the others are still evaluated and the
    /// outcome list has one entry per scenario, in input order.
    pub fn run(
        &self,
        scenarios: &[Scenario],
        selection: &PersonSelection,
        aggregate: Aggregate,
    ) -> Result<Vec<ScenarioOutcome>> {
        let persons = selection.resolve(self.population)?;
        info!(
            "evaluating {} scenarios over {} persons",
            scenarios.len(),
            persons.len()
        );

        let estimators: Vec<Result<EffectiveContactEstimator>> =
            scenarios.iter().map(|s| self.estimator(s)).collect();

        let tasks: Vec<(usize, &EffectiveContactEstimator, &Person)> = estimators
            .iter()
            .enumerate()
            .filter_map(|(k, e)| e.as_ref().ok().map(|e| (k, e)))
            .flat_map(|(k, e)| persons.iter().map(move |&person| (k, e, person)))
            .collect();
        debug!("submitting {} tasks", tasks.len());

        let contacts_only = self.contacts_only;
        let results = self.executor.parallel_map(tasks, |(k, estimator, person)| {
            let value = if contacts_only {
                estimator.effective_contacts(person)
            } else {
                estimator.estimate(person, scenarios[k].transmission())
            };
            (k, person, value)
        });

        // Results arrive in submission order, so each scenario occupies a
        // contiguous run of `persons.len()` entries.
        let mut results = results.into_iter();
        let mut outcomes = Vec::with_capacity(scenarios.len());
        for (scenario, estimator) in scenarios.iter().zip(estimators) {
            let result = match estimator {
                Err(err) => Err(err),
                Ok(_) => collect_scenario(results.by_ref().take(persons.len()), aggregate),
            };
            match &result {
                Ok(estimate) => info!("scenario {}: mean R = {:.4}", scenario, estimate.mean()),
                Err(err) => error!("scenario {} failed: {}", scenario, err),
            }
            outcomes.push(ScenarioOutcome {
                scenario: scenario.clone(),
                result,
            });
        }
        return Ok(outcomes);
    }

    /// Mean expected secondary cases of the selected persons for a single
    /// scenario.
    pub fn mean(&self, scenario: &Scenario, selection: &PersonSelection) -> Result<Real> {
        let outcome = self
            .run(std::slice::from_ref(scenario), selection, Aggregate::Mean)?
            .pop()
            .ok_or_else(|| RzeroError::empty("no scenario evaluated"))?;
        Ok(outcome.into_result()?.mean())
    }
}

fn collect_scenario<'p, I>(results: I, aggregate: Aggregate) -> Result<ScenarioEstimate>
where
    I: Iterator<Item = (usize, &'p Person, Result<Real>)>,
{
    let mut values = vec![];
    let mut first_error = None;
    for (_, person, value) in results {
        match value {
            Ok(r) => values.push(PersonEstimate {
                id: person.id(),
                age: person.age(),
                r,
            }),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    match aggregate {
        Aggregate::Mean => {
            let mut acc = PointStatsAcc::new();
            acc.add_many(values.iter().map(|e| e.r));
            Ok(ScenarioEstimate::Mean(acc.try_stats()?))
        }
        Aggregate::Distribution => Ok(ScenarioEstimate::Distribution(values)),
    }
}

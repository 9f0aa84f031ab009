use log::{error, info};
use rzero::{
    config::{Config, EstimateConfig},
    contact::ContactRateModel,
    parallel::WorkerPool,
    pop::read_population,
    prelude::*,
    sampler::ScenarioEstimate,
};
use serde::Serialize;
use simple_logger::SimpleLogger;

/// One line per scenario when reporting means.
#[derive(Serialize, Debug)]
pub struct MeanRow {
    transmission_probability: Real,
    overdispersion: Option<Real>,
    infectious_period_lengths: String,
    mean: Option<Real>,
    std: Option<Real>,
    min: Option<Real>,
    max: Option<Real>,
    size: Option<usize>,
    error: Option<String>,
}

/// One line per scenario and person when reporting distributions.
#[derive(Serialize, Debug)]
pub struct PersonRow {
    transmission_probability: Real,
    overdispersion: Option<Real>,
    infectious_period_lengths: String,
    id: Id,
    age: Age,
    r: Real,
}

pub fn main() {
    if let Err(err) = SimpleLogger::new().init() {
        eprintln!("could not start logger: {}", err);
    }
    if let Err(err) = run() {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cfg = Config::from_args()?;
    let est = cfg.estimate();

    let population = read_population(est.population_file(), cfg.columns())?;
    let contacts = ContactRateModel::read_xml(est.contact_matrix_file(), est.contact_matrix_kind())?;
    let scenarios = est.scenarios()?;
    let pool = WorkerPool::new(est.workers())?;

    let sampler = ReproductionNumberSampler::new(&population, &contacts, pool)
        .with_normalization(est.normalization())
        .with_tolerance(est.tolerance())
        .with_contacts_only(est.contacts_only());
    let outcomes = sampler.run(&scenarios, est.selection(), est.aggregate())?;

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        error!("{} of {} scenarios failed", failed, outcomes.len());
    }
    write_outcomes(est, &outcomes)?;
    info!("results written to {}", est.output_file().display());
    Ok(())
}

fn write_outcomes(est: &EstimateConfig, outcomes: &[ScenarioOutcome]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(est.output_file())?;

    for outcome in outcomes {
        let scenario = outcome.scenario();
        let transmission = *scenario.transmission();
        let transmission_probability = transmission.probability_or_mean();
        let overdispersion = match transmission {
            Transmission::Gamma { overdispersion, .. } => Some(overdispersion),
            Transmission::Fixed(_) => None,
        };
        let infectious_period_lengths = scenario
            .infectious_period_lengths()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        match (outcome.result(), est.aggregate()) {
            (Ok(ScenarioEstimate::Distribution(values)), _) => {
                for value in values {
                    wtr.serialize(PersonRow {
                        transmission_probability,
                        overdispersion,
                        infectious_period_lengths: infectious_period_lengths.clone(),
                        id: value.id,
                        age: value.age,
                        r: value.r,
                    })?;
                }
            }
            // A distribution table has no room for a failed scenario.
            (Err(err), Aggregate::Distribution) => {
                error!("no distribution for scenario {}: {}", scenario, err);
            }
            (result, _) => {
                let stats = match result {
                    Ok(ScenarioEstimate::Mean(stats)) => Some(*stats),
                    _ => None,
                };
                wtr.serialize(MeanRow {
                    transmission_probability,
                    overdispersion,
                    infectious_period_lengths,
                    mean: stats.map(|s| s.mean()),
                    std: stats.map(|s| s.std()),
                    min: stats.map(|s| s.min()),
                    max: stats.map(|s| s.max()),
                    size: stats.map(|s| s.size()),
                    error: result.as_ref().err().map(|e| e.to_string()),
                })?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

use log::{error, info, warn};
use rzero::{
    config::{Config, PostprocessConfig},
    events::{
        extinction_probability, p80, read_log,
        summary::{
            experiment_log_path, group_by_transmission_probability, read_experiments, summary_path,
            ExperimentSummary, TransmissionGroup,
        },
        RtBand,
    },
    prelude::*,
};
use serde::Serialize;
use simple_logger::SimpleLogger;

/// Dispersion and extinction of a scenario.
#[derive(Serialize, Debug)]
pub struct ScenarioRow {
    scenario: String,
    runs: usize,
    failed_runs: usize,
    extinction_probability: Real,
    mean_secondary_cases: Option<Real>,
    mean_transmission_probability: Option<Real>,
    p80_runs: usize,
    p80_mean: Option<Real>,
    p80_median: Option<Real>,
}

#[derive(Serialize, Debug)]
pub struct RtRow {
    scenario: String,
    day: Day,
    mean: Real,
    median: Real,
    lower: Real,
    upper: Real,
}

/// Secondary cases per index case, by transmission probability.
#[derive(Serialize, Debug)]
pub struct IndexCaseRow {
    scenario: String,
    transmission_probability: Real,
    runs: usize,
    mean: Real,
    mean_no_extinction: Real,
}

impl IndexCaseRow {
    fn new(scenario: &str, group: &TransmissionGroup) -> Self {
        IndexCaseRow {
            scenario: scenario.to_string(),
            transmission_probability: group.transmission_probability(),
            runs: group.runs(),
            mean: group.mean(),
            mean_no_extinction: group.mean_no_extinction(),
        }
    }
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
    let post = cfg.postprocess();
    if post.scenarios().is_empty() {
        warn!("no scenarios configured in [postprocess]");
    }
    let pool = WorkerPool::new(post.workers())?;

    let mut scenario_rows = csv::Writer::from_path(post.output_file())?;
    let mut rt_rows = csv::Writer::from_path(post.rt_file())?;
    let mut index_rows = csv::Writer::from_path(post.index_case_file())?;

    for scenario in post.scenarios() {
        info!("processing scenario {}", scenario);
        let experiments = match read_experiments(summary_path(post.output_dir(), scenario)) {
            Ok(experiments) => experiments,
            Err(err) => {
                error!("scenario {}: cannot read summary: {}", scenario, err);
                continue;
            }
        };
        let runs = reconstruct_runs(&pool, post, scenario, experiments);
        let n_failed = runs.iter().filter(|(_, r)| r.is_err()).count();
        let (experiments, records): (Vec<ExperimentSummary>, Vec<SecondaryCaseRecord>) = runs
            .into_iter()
            .filter_map(|(exp, r)| r.ok().map(|r| (exp, r)))
            .unzip();
        if records.is_empty() {
            error!("scenario {}: no usable experiment", scenario);
            continue;
        }

        let p80s = StatsVec::from(p80(&records, post.extinction_threshold(), post.p80_denominator()));
        let mut mean_cases = PointStatsAcc::new();
        mean_cases.add_many(records.iter().filter_map(|r| r.mean_secondary_cases().ok()));
        let mut mean_probability = PointStatsAcc::new();
        mean_probability.add_many(records.iter().filter_map(|r| r.mean_transmission_probability().ok()));
        scenario_rows.serialize(ScenarioRow {
            scenario: scenario.clone(),
            runs: records.len(),
            failed_runs: n_failed,
            extinction_probability: extinction_probability(&records, post.extinction_threshold())?,
            mean_secondary_cases: mean_cases.try_mean().ok(),
            mean_transmission_probability: mean_probability.try_mean().ok(),
            p80_runs: p80s.size(),
            p80_mean: p80s.try_mean().ok(),
            p80_median: if p80s.size() > 0 { Some(p80s.median()) } else { None },
        })?;

        match RtBand::from_runs(&records, post.num_days(), post.extinction_threshold()) {
            Ok(band) => {
                for day in 0..band.num_days() {
                    rt_rows.serialize(RtRow {
                        scenario: scenario.clone(),
                        day: day as Day,
                        mean: band.mean()[day],
                        median: band.median()[day],
                        lower: band.lower()[day],
                        upper: band.upper()[day],
                    })?;
                }
            }
            Err(err) => warn!("scenario {}: no Rt band: {}", scenario, err),
        }

        let pairs = experiments.iter().zip(&records).filter_map(|(exp, record)| {
            record
                .secondary_cases_per_index_case()
                .ok()
                .map(|cases| (exp.transmission_probability(), cases))
        });
        for group in group_by_transmission_probability(pairs) {
            index_rows.serialize(IndexCaseRow::new(scenario, &group))?;
        }
    }

    scenario_rows.flush()?;
    rt_rows.flush()?;
    index_rows.flush()?;
    info!("results written to {}", post.output_file().display());
    Ok(())
}

/// Replay the event log of every experiment, in parallel. Failed experiments
/// are logged and returned as errors.
fn reconstruct_runs(
    pool: &WorkerPool,
    post: &PostprocessConfig,
    scenario: &str,
    experiments: Vec<ExperimentSummary>,
) -> Vec<(ExperimentSummary, Result<SecondaryCaseRecord>)> {
    let output_dir = post.output_dir();
    let num_days = post.num_days();
    pool.parallel_map(experiments, |exp| {
        let path = experiment_log_path(output_dir, scenario, exp.exp_id());
        let record = read_log(&path)
            .map(|events| SecondaryCaseRecord::reconstruct_until(events, num_days.min(exp.num_days())));
        if let Err(err) = &record {
            error!("scenario {}, experiment {}: {}", scenario, exp.exp_id(), err);
        }
        (exp, record)
    })
}

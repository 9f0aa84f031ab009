//! Layout of simulator output directories and per scenario summaries.
//!
//! ```text
//! <output_dir>/<scenario>/<scenario>_summary.csv
//! <output_dir>/<scenario>/exp0001/event_log.txt
//! ```
use crate::error::Result;
use crate::prelude::{Day, Real};
use crate::utils::{PointStatsAcc, Stats};
use getset::CopyGetters;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

/// One row of a scenario summary. Other columns are ignored.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct ExperimentSummary {
    exp_id: u32,
    transmission_probability: Real,
    num_days: Day,
}

impl ExperimentSummary {
    pub fn new(exp_id: u32, transmission_probability: Real, num_days: Day) -> Self {
        ExperimentSummary {
            exp_id,
            transmission_probability,
            num_days,
        }
    }
}

pub fn summary_path(output_dir: impl AsRef<Path>, scenario: &str) -> PathBuf {
    output_dir
        .as_ref()
        .join(scenario)
        .join(format!("{}_summary.csv", scenario))
}

pub fn experiment_log_path(output_dir: impl AsRef<Path>, scenario: &str, exp_id: u32) -> PathBuf {
    output_dir
        .as_ref()
        .join(scenario)
        .join(format!("exp{:04}", exp_id))
        .join("event_log.txt")
}

pub fn read_experiments_from<R: Read>(source: R) -> Result<Vec<ExperimentSummary>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut rows = vec![];
    for row in reader.deserialize() {
        rows.push(row?);
    }
    return Ok(rows);
}

pub fn read_experiments(path: impl AsRef<Path>) -> Result<Vec<ExperimentSummary>> {
    let path = path.as_ref();
    let rows = read_experiments_from(std::fs::File::open(path)?)?;
    debug!("read {} experiments from {}", rows.len(), path.display());
    Ok(rows)
}

/// Secondary cases per index case of all runs sharing a transmission
/// probability.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct TransmissionGroup {
    transmission_probability: Real,
    runs: usize,
    mean: Real,
    /// Mean over the runs where the index case infected someone; 0 if none
    /// did.
    mean_no_extinction: Real,
}

/// Group (transmission probability, secondary cases per index case) pairs by
/// probability, in increasing order of probability.
pub fn group_by_transmission_probability<I>(pairs: I) -> Vec<TransmissionGroup>
where
    I: IntoIterator<Item = (Real, Real)>,
{
    let mut pairs: Vec<(Real, Real)> = pairs.into_iter().collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups = vec![];
    for chunk in pairs.chunk_by(|a, b| a.0 == b.0) {
        let mut all = PointStatsAcc::new();
        let mut alive = PointStatsAcc::new();
        for &(_, cases) in chunk {
            all.add(cases);
            if cases > 0.0 {
                alive.add(cases);
            }
        }
        groups.push(TransmissionGroup {
            transmission_probability: chunk[0].0,
            runs: chunk.len(),
            mean: all.mean(),
            mean_no_extinction: alive.try_mean().unwrap_or(0.0),
        });
    }
    return groups;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn paths() {
        assert_eq!(
            experiment_log_path("out", "baseline", 7),
            PathBuf::from("out/baseline/exp0007/event_log.txt")
        );
        assert_eq!(
            summary_path("out", "baseline"),
            PathBuf::from("out/baseline/baseline_summary.csv")
        );
    }

    #[test]
    fn reads_summary_ignoring_extra_columns() {
        let csv = "exp_id,population_file,transmission_probability,num_days\n\
                   1,pop.csv,0.05,120\n\
                   2,pop.csv,0.06,120\n";
        let rows = read_experiments_from(csv.as_bytes()).unwrap();
        assert_eq!(rows, vec![ExperimentSummary::new(1, 0.05, 120), ExperimentSummary::new(2, 0.06, 120)]);
    }

    #[test]
    fn bad_summary_row_fails() {
        let csv = "exp_id,transmission_probability,num_days\nx,0.05,120\n";
        assert!(read_experiments_from(csv.as_bytes()).is_err());
    }

    #[test]
    fn groups_are_sorted_by_probability() {
        let groups = group_by_transmission_probability(vec![
            (0.06, 3.0),
            (0.05, 0.0),
            (0.05, 4.0),
            (0.06, 5.0),
            (0.07, 0.0),
        ]);
        let ps: Vec<Real> = groups.iter().map(|g| g.transmission_probability()).collect();
        assert_eq!(ps, vec![0.05, 0.06, 0.07]);
        assert_eq!(groups[0].runs(), 2);
        assert_approx_eq!(groups[0].mean(), 2.0);
        assert_approx_eq!(groups[0].mean_no_extinction(), 4.0);
        assert_approx_eq!(groups[1].mean(), 4.0);
        assert_approx_eq!(groups[2].mean_no_extinction(), 0.0);
    }
}

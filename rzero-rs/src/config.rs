//! Run configuration, read from a TOML file.
//!
//! ```toml
//! [estimate]
//! population_file = "pop.csv"
//! contact_matrix_file = "contact_matrix.xml"
//! transmission_probabilities = [0.05, 0.075]
//! overdispersion = 0.4
//! selection = { random = { size = 1000, seed = 42 } }
//!
//! [postprocess]
//! output_dir = "output"
//! scenarios = ["baseline", "superspreading"]
//!
//! [columns]
//! household = "hh_id"
//! ```
use crate::{
    contact::ContactMatrixKind,
    error::{Result, RzeroError},
    estimator::ContactNormalization,
    events::P80Denominator,
    params::*,
    pop::PopulationColumns,
    prelude::{Day, Real},
    sampler::{Aggregate, PersonSelection, Scenario},
};
use getset::{CopyGetters, Getters};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "conf.toml";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default, Getters)]
#[serde(default)]
#[getset(get = "pub")]
pub struct Config {
    estimate: EstimateConfig,
    postprocess: PostprocessConfig,
    columns: PopulationColumns,
}

/// Settings of the analytic estimator.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Getters, CopyGetters)]
#[serde(default)]
pub struct EstimateConfig {
    #[getset(get = "pub")]
    population_file: PathBuf,
    #[getset(get = "pub")]
    contact_matrix_file: PathBuf,
    #[getset(get_copy = "pub")]
    contact_matrix_kind: ContactMatrixKind,
    #[getset(get_copy = "pub")]
    normalization: ContactNormalization,
    #[getset(get = "pub")]
    infectious_period_lengths: Vec<Day>,
    #[getset(get = "pub")]
    transmission_probabilities: Vec<Real>,
    /// Target R0 values, converted to probabilities with `calibration`.
    #[getset(get = "pub")]
    target_r0: Vec<Real>,
    #[getset(get_copy = "pub")]
    calibration: Option<TransmissionCalibration>,
    /// Without overdispersion every person shares the same transmission
    /// probability.
    #[getset(get_copy = "pub")]
    overdispersion: Option<Real>,
    #[getset(get_copy = "pub")]
    tolerance: Real,
    #[getset(get = "pub")]
    selection: PersonSelection,
    #[getset(get_copy = "pub")]
    aggregate: Aggregate,
    /// Estimate effective contacts only, as if every contact transmitted.
    #[getset(get_copy = "pub")]
    contacts_only: bool,
    #[getset(get_copy = "pub")]
    workers: usize,
    #[getset(get = "pub")]
    output_file: PathBuf,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        EstimateConfig {
            population_file: "population.csv".into(),
            contact_matrix_file: "contact_matrix.xml".into(),
            contact_matrix_kind: ContactMatrixKind::default(),
            normalization: ContactNormalization::default(),
            infectious_period_lengths: INFECTIOUS_PERIOD_LENGTHS.to_vec(),
            transmission_probabilities: TRANSMISSION_PROBABILITIES.to_vec(),
            target_r0: vec![],
            calibration: None,
            overdispersion: None,
            tolerance: QUADRATURE_TOLERANCE,
            selection: PersonSelection::default(),
            aggregate: Aggregate::default(),
            contacts_only: false,
            workers: WORKERS,
            output_file: "rzero_estimates.csv".into(),
        }
    }
}

impl EstimateConfig {
    /// Mean transmission probabilities to evaluate: the explicit ones
    /// followed by the calibrated R0 targets.
    pub fn probabilities(&self) -> Result<Vec<Real>> {
        let mut probabilities = self.transmission_probabilities.clone();
        if !self.target_r0.is_empty() {
            let calibration = self.calibration.ok_or_else(|| {
                RzeroError::config("target_r0 given without a [estimate.calibration] section")
            })?;
            for &r0 in &self.target_r0 {
                let p = calibration.probability_for_r0(r0)?;
                info!("R0 = {} calibrated to p = {:.5}", r0, p);
                probabilities.push(p);
            }
        }
        return Ok(probabilities);
    }

    /// One scenario per transmission probability. Effective contacts do not
    /// depend on transmission, so `contacts_only` gives a single scenario
    /// where every contact transmits.
    pub fn scenarios(&self) -> Result<Vec<Scenario>> {
        if self.contacts_only {
            return Ok(vec![Scenario::new(
                Transmission::Fixed(1.0),
                self.infectious_period_lengths.clone(),
            )]);
        }
        let scenarios = self
            .probabilities()?
            .into_iter()
            .map(|p| {
                let transmission = match self.overdispersion {
                    Some(overdispersion) => Transmission::Gamma {
                        mean: p,
                        overdispersion,
                    },
                    None => Transmission::Fixed(p),
                };
                Scenario::new(transmission, self.infectious_period_lengths.clone())
            })
            .collect();
        return Ok(scenarios);
    }
}

/// Settings of the event log post-processing.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Getters, CopyGetters)]
#[serde(default)]
pub struct PostprocessConfig {
    #[getset(get = "pub")]
    output_dir: PathBuf,
    #[getset(get = "pub")]
    scenarios: Vec<String>,
    #[getset(get_copy = "pub")]
    num_days: Day,
    #[getset(get_copy = "pub")]
    extinction_threshold: u64,
    #[getset(get_copy = "pub")]
    p80_denominator: P80Denominator,
    #[getset(get_copy = "pub")]
    workers: usize,
    /// Per scenario dispersion and extinction table.
    #[getset(get = "pub")]
    output_file: PathBuf,
    /// Per scenario, per day Rt band.
    #[getset(get = "pub")]
    rt_file: PathBuf,
    /// Secondary cases per index case grouped by transmission probability.
    #[getset(get = "pub")]
    index_case_file: PathBuf,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        PostprocessConfig {
            output_dir: "output".into(),
            scenarios: vec![],
            num_days: NUM_DAYS,
            extinction_threshold: EXTINCTION_THRESHOLD,
            p80_denominator: P80Denominator::default(),
            workers: WORKERS,
            output_file: "rzero_postprocess.csv".into(),
            rt_file: "rzero_rt.csv".into(),
            index_case_file: "rzero_index_cases.csv".into(),
        }
    }
}

impl Config {
    pub fn from_toml_str(data: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(data)?;
        cfg.validate()?;
        return Ok(cfg);
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Config::from_toml_str(&data)
    }

    /// Read the file given as first program argument, or `conf.toml`. A
    /// missing default file falls back to the default configuration.
    pub fn from_args() -> Result<Self> {
        match std::env::args().nth(1) {
            Some(path) => {
                info!("reading configuration from {}", path);
                Config::read(path)
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Config::read(DEFAULT_CONFIG_FILE),
            None => {
                warn!("{} not found, using default configuration", DEFAULT_CONFIG_FILE);
                Ok(Config::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let est = &self.estimate;
        if est.infectious_period_lengths.is_empty() || est.infectious_period_lengths.contains(&0) {
            return Err(RzeroError::config(
                "infectious_period_lengths must be a non-empty list of positive days",
            ));
        }
        if !(est.tolerance > 0.0) {
            return Err(RzeroError::config("tolerance must be positive"));
        }
        if let Some(k) = est.overdispersion {
            if !(k > 0.0) {
                return Err(RzeroError::config("overdispersion must be positive"));
            }
        }
        if self.postprocess.num_days == 0 {
            return Err(RzeroError::config("num_days must be positive"));
        }
        Ok(())
    }
}

pub use crate::{
    contact::{ContactMatrixKind, ContactRateModel},
    error::{Result, RzeroError},
    estimator::{ContactNormalization, EffectiveContactEstimator},
    events::{EventRecord, P80Denominator, SecondaryCaseRecord},
    parallel::{ParallelMap, Sequential, WorkerPool},
    params::{Transmission, TransmissionCalibration, TruncatedGamma},
    pop::{Member, Person, PoolId, PoolType, PopulationIndex},
    sampler::{Aggregate, PersonSelection, ReproductionNumberSampler, Scenario, ScenarioOutcome},
    utils::{PointStats, PointStatsAcc, Stats, StatsVec},
    Age, Day, Id, Real, MAX_AGE, MAX_CONTACT_PROBABILITY,
};

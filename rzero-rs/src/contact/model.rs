use super::ContactDocument;
use crate::error::{Result, RzeroError};
use crate::pop::PoolType;
use crate::prelude::{Age, Real, MAX_AGE};
use getset::CopyGetters;
use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// How contact rates are laid out in the survey document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMatrixKind {
    /// One rate per (participant age, contact age) pair.
    Directional,
    /// One rate per participant age, regardless of contact age.
    Aggregated,
}

impl Default for ContactMatrixKind {
    fn default() -> Self {
        ContactMatrixKind::Directional
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RateTable {
    Directional(Array2<Real>),
    Aggregated(Array1<Real>),
}

/// Contact rates of a single pool type.
#[derive(Debug, Clone, PartialEq, CopyGetters)]
pub struct PoolRates {
    #[getset(get_copy = "pub")]
    max_observed_age: Age,
    table: RateTable,
}

impl PoolRates {
    /// Build directional rates from (participant age, contact age, rate)
    /// observations. Later observations of the same pair replace earlier ones.
    pub fn directional<I>(observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Age, Age, Real)>,
    {
        let n = MAX_AGE as usize + 1;
        let mut table = Array2::<Real>::zeros((n, n));
        let mut max_observed_age = None;

        for (age, contact_age, rate) in observations {
            check_observation(age, rate)?;
            check_observation(contact_age, rate)?;
            table[(age as usize, contact_age as usize)] = rate;
            max_observed_age = max_observed_age.max(Some(age));
        }

        let max_observed_age =
            max_observed_age.ok_or_else(|| RzeroError::config("no contact rate observations"))?;
        Ok(PoolRates {
            max_observed_age,
            table: RateTable::Directional(table),
        })
    }

    /// Build aggregated rates from (participant age, rate) observations.
    pub fn aggregated<I>(observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Age, Real)>,
    {
        let mut table = Array1::<Real>::zeros(MAX_AGE as usize + 1);
        let mut max_observed_age = None;

        for (age, rate) in observations {
            check_observation(age, rate)?;
            table[age as usize] = rate;
            max_observed_age = max_observed_age.max(Some(age));
        }

        let max_observed_age =
            max_observed_age.ok_or_else(|| RzeroError::config("no contact rate observations"))?;
        Ok(PoolRates {
            max_observed_age,
            table: RateTable::Aggregated(table),
        })
    }

    /// Contact rate of a person of age `age` with persons of age
    /// `contact_age`. Ages above the oldest participant are clamped to it.
    pub fn rate(&self, age: Age, contact_age: Age) -> Real {
        let max = self.max_observed_age;
        let a1 = age.min(max) as usize;
        let a2 = contact_age.min(max) as usize;
        match &self.table {
            RateTable::Directional(table) => table[(a1, a2)],
            RateTable::Aggregated(table) => table[a1],
        }
    }

    pub fn kind(&self) -> ContactMatrixKind {
        match self.table {
            RateTable::Directional(_) => ContactMatrixKind::Directional,
            RateTable::Aggregated(_) => ContactMatrixKind::Aggregated,
        }
    }
}

fn check_observation(age: Age, rate: Real) -> Result<()> {
    if age > MAX_AGE {
        return Err(RzeroError::config(format!(
            "contact survey age {} exceeds maximum age {}",
            age, MAX_AGE
        )));
    }
    if !(rate.is_finite() && rate >= 0.0) {
        return Err(RzeroError::config(format!("invalid contact rate {}", rate)));
    }
    Ok(())
}

/// Contact rates for every pool type present in the survey.
///
/// Lookups are pure; the model is built once and shared read-only by all
/// workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactRateModel {
    pools: [Option<PoolRates>; 5],
}

impl ContactRateModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rates for a pool type, replacing previous ones.
    pub fn insert(&mut self, pool_type: PoolType, rates: PoolRates) -> &mut Self {
        self.pools[pool_type.index()] = Some(rates);
        return self;
    }

    /// Build model from a parsed survey document. Pool types missing from the
    /// document are left without data and fail on lookup.
    pub fn from_document(doc: &ContactDocument, kind: ContactMatrixKind) -> Result<Self> {
        let mut model = ContactRateModel::new();
        for pool_type in PoolType::ALL {
            let section = match doc.section(pool_type) {
                Some(section) if !section.participants.is_empty() => section,
                _ => {
                    debug!("contact matrix has no data for {}", pool_type);
                    continue;
                }
            };

            let rates = match kind {
                ContactMatrixKind::Directional => {
                    let mut observations = vec![];
                    for p in &section.participants {
                        for c in &p.contacts.entries {
                            let contact_age = c.numeric_age().ok_or_else(|| {
                                RzeroError::config(format!(
                                    "{}: participant {} has a contact without numeric age",
                                    pool_type, p.age
                                ))
                            })?;
                            observations.push((p.age, contact_age, c.rate));
                        }
                    }
                    PoolRates::directional(observations)
                }
                ContactMatrixKind::Aggregated => {
                    let mut observations = vec![];
                    for p in &section.participants {
                        let contact = p.contacts.entries.first().ok_or_else(|| {
                            RzeroError::config(format!(
                                "{}: participant {} has no aggregated contact rate",
                                pool_type, p.age
                            ))
                        })?;
                        observations.push((p.age, contact.rate));
                    }
                    PoolRates::aggregated(observations)
                }
            }
            .map_err(|e| RzeroError::config(format!("{}: {}", pool_type, e)))?;

            debug!(
                "contact rates for {}: {} participants, max age {}",
                pool_type,
                section.participants.len(),
                rates.max_observed_age()
            );
            model.insert(pool_type, rates);
        }
        return Ok(model);
    }

    /// Parse an XML survey document.
    pub fn from_xml_str(text: &str, kind: ContactMatrixKind) -> Result<Self> {
        Self::from_document(&ContactDocument::from_xml_str(text)?, kind)
    }

    /// Read an XML survey document from disk.
    pub fn read_xml(path: impl AsRef<Path>, kind: ContactMatrixKind) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading contact matrix from {}", path.display());
        Self::from_xml_str(&fs::read_to_string(path)?, kind)
    }

    /// Rates for a pool type.
    pub fn pool(&self, pool_type: PoolType) -> Result<&PoolRates> {
        self.pools[pool_type.index()]
            .as_ref()
            .ok_or_else(|| RzeroError::config(format!("no contact rates for pool type {}", pool_type)))
    }

    pub fn has(&self, pool_type: PoolType) -> bool {
        self.pools[pool_type.index()].is_some()
    }

    /// Fail early if any of the given pool types has no data.
    pub fn require(&self, pool_types: &[PoolType]) -> Result<()> {
        for &pool_type in pool_types {
            self.pool(pool_type)?;
        }
        Ok(())
    }

    /// Directional contact rate between persons aged `age1` and `age2`.
    pub fn rate(&self, pool_type: PoolType, age1: Age, age2: Age) -> Result<Real> {
        for age in [age1, age2] {
            if age > MAX_AGE {
                return Err(RzeroError::out_of_range(format!(
                    "age {} exceeds maximum age {}",
                    age, MAX_AGE
                )));
            }
        }
        Ok(self.pool(pool_type)?.rate(age1, age2))
    }
}

use super::{PoolId, PoolType, PopulationIndex};
use crate::error::{Result, RzeroError};
use crate::prelude::{Age, Real};
use getset::Getters;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, path::Path};

/// Column names of the population file.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
#[getset(get = "pub")]
pub struct PopulationColumns {
    age: String,
    household: String,
    work: String,
    school: String,
    primary_community: String,
    secondary_community: String,
}

impl Default for PopulationColumns {
    fn default() -> Self {
        PopulationColumns {
            age: "age".into(),
            household: "household_id".into(),
            work: "work_id".into(),
            school: "school_id".into(),
            primary_community: "primary_community".into(),
            secondary_community: "secondary_community".into(),
        }
    }
}

impl PopulationColumns {
    /// Column holding pool ids for the given pool type.
    pub fn pool_column(&self, pool_type: PoolType) -> &str {
        match pool_type {
            PoolType::Household => &self.household,
            PoolType::Work => &self.work,
            PoolType::School => &self.school,
            PoolType::PrimaryCommunity => &self.primary_community,
            PoolType::SecondaryCommunity => &self.secondary_community,
        }
    }
}

/// Read a population file. Person ids follow row order, starting at 1.
pub fn read_population(path: impl AsRef<Path>, columns: &PopulationColumns) -> Result<PopulationIndex> {
    let path = path.as_ref();
    debug!("reading population from {}", path.display());
    let index = read_population_from(File::open(path)?, columns)?;
    info!(
        "population {}: {} persons, {} households",
        path.display(),
        index.count(),
        index.n_pools(PoolType::Household)
    );
    return Ok(index);
}

/// Read population rows from any CSV source with a header line.
pub fn read_population_from<R: Read>(source: R, columns: &PopulationColumns) -> Result<PopulationIndex> {
    let mut reader = csv::Reader::from_reader(source);
    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| RzeroError::config(format!("population file has no column '{}'", name)))
    };

    let age_col = position(columns.age())?;
    let mut pool_cols = [0usize; 5];
    for pt in PoolType::ALL {
        pool_cols[pt.index()] = position(columns.pool_column(pt))?;
    }

    let mut index = PopulationIndex::new();
    for (i, res) in reader.records().enumerate() {
        let record = res?;
        let row = i + 1;
        let field = |col: usize| record.get(col).unwrap_or("").trim();

        let age = parse_age(field(age_col)).map_err(|msg| {
            RzeroError::config(format!("row {}, column '{}': {}", row, columns.age(), msg))
        })?;

        let mut pool_ids = [0 as PoolId; 5];
        for pt in PoolType::ALL {
            pool_ids[pt.index()] = parse_pool_id(field(pool_cols[pt.index()])).map_err(|msg| {
                RzeroError::config(format!(
                    "row {}, column '{}': {}",
                    row,
                    columns.pool_column(pt),
                    msg
                ))
            })?;
        }
        index.push(age, pool_ids);
    }
    return Ok(index);
}

fn parse_age(text: &str) -> std::result::Result<Age, String> {
    text.parse::<Age>()
        .map_err(|_| format!("invalid age '{}'", text))
}

/// Pool ids may be written as reals ("12.0"); they are truncated to integers.
fn parse_pool_id(text: &str) -> std::result::Result<PoolId, String> {
    let value: Real = text
        .parse()
        .map_err(|_| format!("invalid pool id '{}'", text))?;
    if !value.is_finite() {
        return Err(format!("invalid pool id '{}'", text));
    }
    Ok(value.trunc() as PoolId)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POPULATION: &str = "\
age,household_id,school_id,work_id,primary_community,secondary_community
30,1.0,0,7,3,4
31,1.0,0.0,0,3,4
8,2,5,0,3,-1
";

    #[test]
    fn read_fractional_pool_ids() {
        let index = read_population_from(POPULATION.as_bytes(), &PopulationColumns::default()).unwrap();
        assert_eq!(index.count(), 3);
        assert_eq!(index.members(PoolType::Household, 1).len(), 2);
        assert_eq!(index.members(PoolType::School, 5)[0].id, 3);
        assert_eq!(index.members(PoolType::Work, 7)[0].age, 30);
        assert_eq!(index.person(3).unwrap().pool_id(PoolType::SecondaryCommunity), -1);
    }

    #[test]
    fn malformed_age_is_a_configuration_error() {
        let data = "age,household_id,school_id,work_id,primary_community,secondary_community\nabc,1,0,0,0,0\n";
        let err = read_population_from(data.as_bytes(), &PopulationColumns::default()).unwrap_err();
        assert!(matches!(err, RzeroError::Configuration(_)));
    }

    #[test]
    fn missing_column_is_a_configuration_error() {
        let data = "age,household_id\n30,1\n";
        let err = read_population_from(data.as_bytes(), &PopulationColumns::default()).unwrap_err();
        assert!(matches!(err, RzeroError::Configuration(_)));
    }
}

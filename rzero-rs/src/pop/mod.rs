//! Persons and the contact pools they belong to.
mod reader;

pub use reader::*;

use crate::prelude::{Age, Id};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Identifier of a pool inside its pool type. Values <= 0 mean "no pool".
pub type PoolId = i64;

/// The social mixing contexts recognized by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    Household,
    Work,
    School,
    PrimaryCommunity,
    SecondaryCommunity,
}

impl PoolType {
    pub const ALL: [PoolType; 5] = [
        PoolType::Household,
        PoolType::Work,
        PoolType::School,
        PoolType::PrimaryCommunity,
        PoolType::SecondaryCommunity,
    ];

    /// Position of the pool type in [`PoolType::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in contact matrix files and config.
    pub fn name(self) -> &'static str {
        match self {
            PoolType::Household => "household",
            PoolType::Work => "work",
            PoolType::School => "school",
            PoolType::PrimaryCommunity => "primary_community",
            PoolType::SecondaryCommunity => "secondary_community",
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A person of the synthetic population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct Person {
    #[getset(get_copy = "pub")]
    id: Id,
    #[getset(get_copy = "pub")]
    age: Age,
    pool_ids: [PoolId; 5],
}

impl Person {
    pub fn new(id: Id, age: Age, pool_ids: [PoolId; 5]) -> Self {
        Person { id, age, pool_ids }
    }

    /// Raw pool id for the given pool type, possibly <= 0.
    pub fn pool_id(&self, pool_type: PoolType) -> PoolId {
        self.pool_ids[pool_type.index()]
    }

    /// Iterate over the pools this person is actually a member of.
    pub fn pools(&self) -> impl Iterator<Item = (PoolType, PoolId)> + '_ {
        PoolType::ALL
            .into_iter()
            .map(move |pt| (pt, self.pool_id(pt)))
            .filter(|&(_, id)| id > 0)
    }
}

/// Pool member as stored in membership lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub id: Id,
    pub age: Age,
}

/// Population with per pool type membership lists.
///
/// Built once by scanning person records in order and never mutated after
/// that. Members of each pool are kept in input order.
#[derive(Debug, Clone, Default, Getters)]
pub struct PopulationIndex {
    #[getset(get = "pub")]
    persons: Vec<Person>,
    pools: [HashMap<PoolId, Vec<Member>>; 5],
}

impl PopulationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build index from (age, pool ids) rows. Ids are assigned from 1.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Age, [PoolId; 5])>,
    {
        let mut index = PopulationIndex::new();
        for (age, pool_ids) in rows {
            index.push(age, pool_ids);
        }
        return index;
    }

    /// Register a new person and return its id.
    pub fn push(&mut self, age: Age, pool_ids: [PoolId; 5]) -> Id {
        let id = self.persons.len() as Id + 1;
        let person = Person::new(id, age, pool_ids);
        for (pool_type, pool_id) in person.pools() {
            self.pools[pool_type.index()]
                .entry(pool_id)
                .or_insert_with(Vec::new)
                .push(Member { id, age });
        }
        self.persons.push(person);
        return id;
    }

    /// Population size.
    pub fn count(&self) -> usize {
        self.persons.len()
    }

    /// Get person by position in input order (0-based).
    pub fn get(&self, index: usize) -> Option<&Person> {
        self.persons.get(index)
    }

    /// Get person by id (1-based).
    pub fn person(&self, id: Id) -> Option<&Person> {
        if id == 0 {
            return None;
        }
        self.persons.get((id - 1) as usize)
    }

    /// Members of a pool, or an empty slice for unknown pools.
    pub fn members(&self, pool_type: PoolType, pool_id: PoolId) -> &[Member] {
        self.pools[pool_type.index()]
            .get(&pool_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct pools of the given type.
    pub fn n_pools(&self, pool_type: PoolType) -> usize {
        self.pools[pool_type.index()].len()
    }
}

//! Serde mapping of the survey contact matrix document.
//!
//! The document has one section per pool type. Each section lists survey
//! participants by age, and each participant lists contacts either by contact
//! age (directional form) or as a single aggregated rate.
use crate::error::Result;
use crate::pop::PoolType;
use crate::prelude::{Age, Real};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContactDocument {
    pub household: Option<PoolSection>,
    pub work: Option<PoolSection>,
    pub school: Option<PoolSection>,
    pub primary_community: Option<PoolSection>,
    pub secondary_community: Option<PoolSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoolSection {
    #[serde(rename = "participant")]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Participant {
    pub age: Age,
    #[serde(default)]
    pub contacts: Contacts,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Contacts {
    #[serde(rename = "contact")]
    pub entries: Vec<Contact>,
}

/// A contact entry. Aggregated documents write a non numeric age (e.g. "all")
/// or no age at all.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub age: Option<String>,
    pub rate: Real,
}

impl ContactDocument {
    /// Parse an XML document.
    pub fn from_xml_str(text: &str) -> Result<Self> {
        Ok(quick_xml::de::from_str(text)?)
    }

    /// Section for the given pool type, if present in the document.
    pub fn section(&self, pool_type: PoolType) -> Option<&PoolSection> {
        match pool_type {
            PoolType::Household => self.household.as_ref(),
            PoolType::Work => self.work.as_ref(),
            PoolType::School => self.school.as_ref(),
            PoolType::PrimaryCommunity => self.primary_community.as_ref(),
            PoolType::SecondaryCommunity => self.secondary_community.as_ref(),
        }
    }
}

impl Contact {
    /// Contact age, if the entry refers to a specific age.
    pub fn numeric_age(&self) -> Option<Age> {
        self.age.as_deref().and_then(|a| a.trim().parse().ok())
    }
}

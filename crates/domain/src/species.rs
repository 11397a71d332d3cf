//! 种族实体定义

use serde::Serialize;

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{SpeciesId, SpeciesName};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Species {
    pub id: SpeciesId,
    pub species_name: SpeciesName,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpecies {
    pub species_name: SpeciesName,
    pub description: String,
}

impl NewSpecies {
    pub fn new(species_name: SpeciesName, description: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            species_name,
            description: parse_description(description)?,
        })
    }

    pub fn with_id(self, id: SpeciesId) -> Species {
        Species {
            id,
            species_name: self.species_name,
            description: self.description,
        }
    }
}

impl Species {
    pub fn new(
        id: SpeciesId,
        species_name: SpeciesName,
        description: impl Into<String>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            species_name,
            description: parse_description(description)?,
        })
    }
}

fn parse_description(value: impl Into<String>) -> DomainResult<String> {
    let value = value.into();
    if value.trim().is_empty() {
        return Err(DomainError::invalid_argument("description", "cannot be blank"));
    }
    Ok(value)
}

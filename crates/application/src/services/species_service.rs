use std::{collections::HashSet, sync::Arc};

use domain::{DomainError, NewSpecies, Species, SpeciesId, SpeciesName};
use tracing::{info, warn};

use crate::{error::ApplicationError, lookup::Lookup, repository::SpeciesRepository};

#[derive(Debug, Clone)]
pub struct CreateSpeciesRequest {
    pub species_name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UpdateSpeciesRequest {
    pub id: i32,
    pub species_name: String,
    pub description: String,
}

pub struct SpeciesServiceDependencies {
    pub species_repository: Arc<dyn SpeciesRepository>,
}

pub struct SpeciesService {
    deps: SpeciesServiceDependencies,
}

impl SpeciesService {
    pub fn new(deps: SpeciesServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn add(&self, request: CreateSpeciesRequest) -> Result<Species, ApplicationError> {
        let species_name = SpeciesName::parse(request.species_name)?;
        let species = NewSpecies::new(species_name, request.description)?;

        let stored = self.deps.species_repository.create(species).await?;
        info!(species_id = %stored.id, species_name = %stored.species_name, "species created");
        Ok(stored)
    }

    pub async fn find_all(&self) -> Result<HashSet<Species>, ApplicationError> {
        let species = self.deps.species_repository.find_all().await?;
        Ok(species.into_iter().collect())
    }

    /// 名称为空时直接返回 `InvalidKey`，不访问持久化层
    pub async fn find_by_name(&self, name: &str) -> Result<Lookup<Species>, ApplicationError> {
        if name.is_empty() {
            warn!("species name must not be empty");
            return Ok(Lookup::InvalidKey);
        }

        self.deps
            .species_repository
            .find_by_species_name(name)
            .await?
            .map(Lookup::Found)
            .ok_or_else(|| DomainError::SpeciesNotFound.into())
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Lookup<Species>, ApplicationError> {
        if id <= 0 {
            warn!(id, "id must be greater than 0");
            return Ok(Lookup::InvalidKey);
        }

        self.deps
            .species_repository
            .find_by_id(SpeciesId::new(id))
            .await?
            .map(Lookup::Found)
            .ok_or_else(|| DomainError::SpeciesNotFound.into())
    }

    /// 仍被角色引用的种族无法删除
    pub async fn remove(&self, id: i32) -> Result<(), ApplicationError> {
        self.deps
            .species_repository
            .delete_by_id(SpeciesId::new(id))
            .await?;
        info!(species_id = id, "species removed");
        Ok(())
    }

    pub async fn update(&self, request: UpdateSpeciesRequest) -> Result<Species, ApplicationError> {
        if request.id <= 0 {
            return Err(DomainError::invalid_argument("id", "must be greater than 0").into());
        }
        let species = Species::new(
            SpeciesId::new(request.id),
            SpeciesName::parse(request.species_name)?,
            request.description,
        )?;

        Ok(self.deps.species_repository.save(species).await?)
    }
}

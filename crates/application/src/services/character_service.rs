use std::{collections::HashSet, sync::Arc};

use domain::{
    Character, CharacterId, CharacterName, DomainError, ImageUrl, NewCharacter, SpeciesId, UserId,
};
use tracing::{info, warn};

use crate::{error::ApplicationError, lookup::Lookup, repository::CharacterRepository};

#[derive(Debug, Clone)]
pub struct CreateCharacterRequest {
    pub name: String,
    pub image_url: Option<String>,
    pub owner_id: i32,
    pub species_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct UpdateCharacterRequest {
    pub id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub owner_id: i32,
    pub species_id: Option<i32>,
}

pub struct CharacterServiceDependencies {
    pub character_repository: Arc<dyn CharacterRepository>,
}

pub struct CharacterService {
    deps: CharacterServiceDependencies,
}

impl CharacterService {
    pub fn new(deps: CharacterServiceDependencies) -> Self {
        Self { deps }
    }

    /// 所属用户/种族是否存在由持久化层的外键约束检查
    pub async fn add_character(
        &self,
        request: CreateCharacterRequest,
    ) -> Result<Character, ApplicationError> {
        let name = CharacterName::parse(request.name)?;
        let image_url = ImageUrl::parse_optional(request.image_url)?;
        let owner_id = parse_owner(request.owner_id)?;
        let species_id = parse_species(request.species_id)?;

        let stored = self
            .deps
            .character_repository
            .create(NewCharacter::new(name, image_url, owner_id, species_id))
            .await?;

        info!(character_id = %stored.id, owner_id = %stored.owner_id, "character created");
        Ok(stored)
    }

    pub async fn find_all(&self) -> Result<HashSet<Character>, ApplicationError> {
        let characters = self.deps.character_repository.find_all().await?;
        Ok(characters.into_iter().collect())
    }

    /// 用户没有角色时返回空集合，不是错误
    pub async fn find_by_owner_id(&self, id: i32) -> Result<HashSet<Character>, ApplicationError> {
        let characters = self
            .deps
            .character_repository
            .find_by_owner_id(UserId::new(id))
            .await?;
        Ok(characters.into_iter().collect())
    }

    /// 多个同名角色时取 id 最小的一个
    pub async fn find_by_name(&self, name: &str) -> Result<Character, ApplicationError> {
        self.deps
            .character_repository
            .find_by_name(name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::CharacterNotFound.into())
    }

    pub async fn find_by_species_id(&self, id: i32) -> Result<Vec<Character>, ApplicationError> {
        Ok(self
            .deps
            .character_repository
            .find_by_species_id(SpeciesId::new(id))
            .await?)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Lookup<Character>, ApplicationError> {
        if id <= 0 {
            warn!(id, "id must be greater than 0");
            return Ok(Lookup::InvalidKey);
        }

        self.deps
            .character_repository
            .find_by_id(CharacterId::new(id))
            .await?
            .map(Lookup::Found)
            .ok_or_else(|| DomainError::CharacterNotFound.into())
    }

    pub async fn remove(&self, id: i32) -> Result<(), ApplicationError> {
        self.deps
            .character_repository
            .delete_by_id(CharacterId::new(id))
            .await?;
        info!(character_id = id, "character removed");
        Ok(())
    }

    pub async fn update(
        &self,
        request: UpdateCharacterRequest,
    ) -> Result<Character, ApplicationError> {
        if request.id <= 0 {
            return Err(DomainError::invalid_argument("id", "must be greater than 0").into());
        }
        let character = Character {
            id: CharacterId::new(request.id),
            name: CharacterName::parse(request.name)?,
            image_url: ImageUrl::parse_optional(request.image_url)?,
            owner_id: parse_owner(request.owner_id)?,
            species_id: parse_species(request.species_id)?,
        };

        Ok(self.deps.character_repository.save(character).await?)
    }
}

fn parse_owner(owner_id: i32) -> Result<UserId, DomainError> {
    let owner_id = UserId::new(owner_id);
    if !owner_id.is_valid() {
        return Err(DomainError::invalid_argument("owner_id", "a character must have an owner"));
    }
    Ok(owner_id)
}

fn parse_species(species_id: Option<i32>) -> Result<Option<SpeciesId>, DomainError> {
    match species_id.map(SpeciesId::new) {
        Some(id) if !id.is_valid() => Err(DomainError::invalid_argument(
            "species_id",
            "must be greater than 0",
        )),
        other => Ok(other),
    }
}

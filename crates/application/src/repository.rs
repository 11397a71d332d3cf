//! 持久化端口，每个实体一个。
//!
//! 唯一约束与外键约束由实现方负责，违反时分别返回
//! `RepositoryError::Conflict` 与 `RepositoryError::ReferenceViolation`。

use async_trait::async_trait;
use domain::{
    Character, CharacterId, NewCharacter, NewSpecies, NewUser, RepositoryError, Species,
    SpeciesId, User, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
    /// 按 id 整体写入（存在则替换，不存在则插入）
    async fn save(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<User>, RepositoryError>;
    /// 不存在时返回 `NotFound`；仍拥有角色时返回 `ReferenceViolation`
    async fn delete_by_id(&self, id: UserId) -> Result<(), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepository: Send + Sync {
    async fn create(&self, character: NewCharacter) -> Result<Character, RepositoryError>;
    async fn save(&self, character: Character) -> Result<Character, RepositoryError>;
    async fn find_by_id(&self, id: CharacterId) -> Result<Option<Character>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Character>, RepositoryError>;
    async fn find_by_owner_id(&self, owner_id: UserId) -> Result<Vec<Character>, RepositoryError>;
    /// 结果按 id 升序
    async fn find_by_name(&self, name: &str) -> Result<Vec<Character>, RepositoryError>;
    /// 结果按 id 升序
    async fn find_by_species_id(
        &self,
        species_id: SpeciesId,
    ) -> Result<Vec<Character>, RepositoryError>;
    async fn delete_by_id(&self, id: CharacterId) -> Result<(), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeciesRepository: Send + Sync {
    async fn create(&self, species: NewSpecies) -> Result<Species, RepositoryError>;
    async fn save(&self, species: Species) -> Result<Species, RepositoryError>;
    async fn find_by_id(&self, id: SpeciesId) -> Result<Option<Species>, RepositoryError>;
    async fn find_all(&self) -> Result<Vec<Species>, RepositoryError>;
    async fn find_by_species_name(&self, name: &str) -> Result<Option<Species>, RepositoryError>;
    /// 仍被角色引用时返回 `ReferenceViolation`
    async fn delete_by_id(&self, id: SpeciesId) -> Result<(), RepositoryError>;
}

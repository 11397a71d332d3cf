//! 进程内仓储
//!
//! 三个仓储共享同一份 [`MemoryStore`]，以便像数据库一样检查跨表的
//! 唯一约束与外键约束（删除时 RESTRICT）。用于开发模式与测试。

use std::collections::BTreeMap;
use std::sync::Arc;

use application::{CharacterRepository, SpeciesRepository, UserRepository};
use async_trait::async_trait;
use domain::{
    Character, CharacterId, NewCharacter, NewSpecies, NewUser, RepositoryError, Species,
    SpeciesId, User, UserId,
};
use tokio::sync::RwLock;

#[derive(Debug)]
struct Tables {
    users: BTreeMap<i32, User>,
    characters: BTreeMap<i32, Character>,
    species: BTreeMap<i32, Species>,
    next_user_id: i32,
    next_character_id: i32,
    next_species_id: i32,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            characters: BTreeMap::new(),
            species: BTreeMap::new(),
            next_user_id: 1,
            next_character_id: 1,
            next_species_id: 1,
        }
    }
}

impl Tables {
    fn check_user_unique(&self, user: &User) -> Result<(), RepositoryError> {
        for existing in self.users.values().filter(|existing| existing.id != user.id) {
            if existing.username == user.username {
                return Err(RepositoryError::conflict(format!(
                    "username {} already exists",
                    user.username.as_str()
                )));
            }
            if existing.email == user.email {
                return Err(RepositoryError::conflict(format!(
                    "email {} already exists",
                    user.email.as_str()
                )));
            }
        }
        Ok(())
    }

    fn check_species_unique(&self, species: &Species) -> Result<(), RepositoryError> {
        let taken = self
            .species
            .values()
            .any(|existing| existing.id != species.id && existing.species_name == species.species_name);
        if taken {
            return Err(RepositoryError::conflict(format!(
                "species {} already exists",
                species.species_name.as_str()
            )));
        }
        Ok(())
    }

    fn check_character_references(&self, character: &Character) -> Result<(), RepositoryError> {
        if !self.users.contains_key(&character.owner_id.value()) {
            return Err(RepositoryError::reference_violation(format!(
                "owner {} does not exist",
                character.owner_id
            )));
        }
        if let Some(species_id) = character.species_id {
            if !self.species.contains_key(&species_id.value()) {
                return Err(RepositoryError::reference_violation(format!(
                    "species {species_id} does not exist"
                )));
            }
        }
        Ok(())
    }
}

/// 序列停在 `i32::MAX` 且该 id 已被占用时，与数据库序列耗尽一样报存储错误
fn next_id<T>(
    candidate: i32,
    table: &BTreeMap<i32, T>,
    name: &str,
) -> Result<i32, RepositoryError> {
    if table.contains_key(&candidate) {
        return Err(RepositoryError::storage(format!("{name} id sequence exhausted")));
    }
    Ok(candidate)
}

/// 共享存储句柄，克隆后指向同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_repository(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            store: self.clone(),
        }
    }

    pub fn character_repository(&self) -> InMemoryCharacterRepository {
        InMemoryCharacterRepository {
            store: self.clone(),
        }
    }

    pub fn species_repository(&self) -> InMemorySpeciesRepository {
        InMemorySpeciesRepository {
            store: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    store: MemoryStore,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.store.tables.write().await;
        let id = next_id(tables.next_user_id, &tables.users, "users")?;
        let user = user.with_id(UserId::new(id));
        tables.check_user_unique(&user)?;
        tables.next_user_id = id.saturating_add(1);
        tables.users.insert(user.id.value(), user.clone());
        Ok(user)
    }

    async fn save(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.store.tables.write().await;
        tables.check_user_unique(&user)?;
        tables.next_user_id = tables.next_user_id.max(user.id.value().saturating_add(1));
        tables.users.insert(user.id.value(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.get(&id.value()).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username.as_str() == username)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.values().cloned().collect())
    }

    async fn delete_by_id(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.store.tables.write().await;
        if !tables.users.contains_key(&id.value()) {
            return Err(RepositoryError::NotFound);
        }
        if tables.characters.values().any(|character| character.owner_id == id) {
            return Err(RepositoryError::reference_violation(format!(
                "user {id} still owns characters"
            )));
        }
        tables.users.remove(&id.value());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCharacterRepository {
    store: MemoryStore,
}

impl InMemoryCharacterRepository {
    async fn filter(&self, predicate: impl Fn(&Character) -> bool) -> Vec<Character> {
        let tables = self.store.tables.read().await;
        tables
            .characters
            .values()
            .filter(|character| predicate(character))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CharacterRepository for InMemoryCharacterRepository {
    async fn create(&self, character: NewCharacter) -> Result<Character, RepositoryError> {
        let mut tables = self.store.tables.write().await;
        let id = next_id(tables.next_character_id, &tables.characters, "characters")?;
        let character = character.with_id(CharacterId::new(id));
        tables.check_character_references(&character)?;
        tables.next_character_id = id.saturating_add(1);
        tables
            .characters
            .insert(character.id.value(), character.clone());
        Ok(character)
    }

    async fn save(&self, character: Character) -> Result<Character, RepositoryError> {
        let mut tables = self.store.tables.write().await;
        tables.check_character_references(&character)?;
        tables.next_character_id = tables
            .next_character_id
            .max(character.id.value().saturating_add(1));
        tables
            .characters
            .insert(character.id.value(), character.clone());
        Ok(character)
    }

    async fn find_by_id(&self, id: CharacterId) -> Result<Option<Character>, RepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables.characters.get(&id.value()).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Character>, RepositoryError> {
        Ok(self.filter(|_| true).await)
    }

    async fn find_by_owner_id(&self, owner_id: UserId) -> Result<Vec<Character>, RepositoryError> {
        Ok(self.filter(|character| character.owner_id == owner_id).await)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Character>, RepositoryError> {
        Ok(self
            .filter(|character| character.name.as_str() == name)
            .await)
    }

    async fn find_by_species_id(
        &self,
        species_id: SpeciesId,
    ) -> Result<Vec<Character>, RepositoryError> {
        Ok(self
            .filter(|character| character.species_id == Some(species_id))
            .await)
    }

    async fn delete_by_id(&self, id: CharacterId) -> Result<(), RepositoryError> {
        let mut tables = self.store.tables.write().await;
        tables
            .characters
            .remove(&id.value())
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Debug, Clone)]
pub struct InMemorySpeciesRepository {
    store: MemoryStore,
}

#[async_trait]
impl SpeciesRepository for InMemorySpeciesRepository {
    async fn create(&self, species: NewSpecies) -> Result<Species, RepositoryError> {
        let mut tables = self.store.tables.write().await;
        let id = next_id(tables.next_species_id, &tables.species, "species")?;
        let species = species.with_id(SpeciesId::new(id));
        tables.check_species_unique(&species)?;
        tables.next_species_id = id.saturating_add(1);
        tables.species.insert(species.id.value(), species.clone());
        Ok(species)
    }

    async fn save(&self, species: Species) -> Result<Species, RepositoryError> {
        let mut tables = self.store.tables.write().await;
        tables.check_species_unique(&species)?;
        tables.next_species_id = tables
            .next_species_id
            .max(species.id.value().saturating_add(1));
        tables.species.insert(species.id.value(), species.clone());
        Ok(species)
    }

    async fn find_by_id(&self, id: SpeciesId) -> Result<Option<Species>, RepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables.species.get(&id.value()).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Species>, RepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables.species.values().cloned().collect())
    }

    async fn find_by_species_name(&self, name: &str) -> Result<Option<Species>, RepositoryError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .species
            .values()
            .find(|species| species.species_name.as_str() == name)
            .cloned())
    }

    async fn delete_by_id(&self, id: SpeciesId) -> Result<(), RepositoryError> {
        let mut tables = self.store.tables.write().await;
        if !tables.species.contains_key(&id.value()) {
            return Err(RepositoryError::NotFound);
        }
        if tables
            .characters
            .values()
            .any(|character| character.species_id == Some(id))
        {
            return Err(RepositoryError::reference_violation(format!(
                "species {id} is still referenced by characters"
            )));
        }
        tables.species.remove(&id.value());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CharacterName, PasswordHash, SpeciesName, UserEmail, Username};

    fn new_user(username: &str) -> NewUser {
        NewUser::new(
            Username::parse(username).unwrap(),
            UserEmail::parse(format!("{username}@example.com")).unwrap(),
            PasswordHash::new("$2b$04$hash").unwrap(),
        )
    }

    fn new_character(name: &str, owner: UserId, species: Option<SpeciesId>) -> NewCharacter {
        NewCharacter::new(CharacterName::parse(name).unwrap(), None, owner, species)
    }

    fn new_species(name: &str) -> NewSpecies {
        NewSpecies::new(SpeciesName::parse(name).unwrap(), "A species").unwrap()
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = MemoryStore::new();
        let users = store.user_repository();

        let first = users.create(new_user("alpha1")).await.unwrap();
        let second = users.create(new_user("bravo2")).await.unwrap();

        assert_eq!(first.id, UserId::new(1));
        assert_eq!(second.id, UserId::new(2));
        assert_eq!(users.find_all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = MemoryStore::new();
        let users = store.user_repository();
        users.create(new_user("alpha1")).await.unwrap();

        let result = users.create(new_user("alpha1")).await;
        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
        // 失败的插入不消耗 id
        let next = users.create(new_user("bravo2")).await.unwrap();
        assert_eq!(next.id, UserId::new(2));
    }

    #[tokio::test]
    async fn save_at_max_id_does_not_overflow() {
        let store = MemoryStore::new();
        let users = store.user_repository();

        let user = new_user("alpha1").with_id(UserId::new(i32::MAX));
        assert_eq!(users.save(user.clone()).await.unwrap(), user);

        // 序列已耗尽，新建失败但不覆盖已有记录
        let result = users.create(new_user("bravo2")).await;
        assert!(matches!(result, Err(RepositoryError::Storage { .. })));
        assert_eq!(
            users.find_by_id(UserId::new(i32::MAX)).await.unwrap(),
            Some(user)
        );

        assert!(users.create(new_user("charlie3")).await.is_err());

        let species = store.species_repository();
        let wookiee = new_species("Wookiee").with_id(SpeciesId::new(i32::MAX));
        species.save(wookiee).await.unwrap();
        assert!(species.create(new_species("Ewok")).await.is_err());

        let characters = store.character_repository();
        let chewie = new_character("Chewbacca", UserId::new(i32::MAX), None)
            .with_id(CharacterId::new(i32::MAX));
        characters.save(chewie).await.unwrap();
        assert!(characters
            .create(new_character("Han Solo", UserId::new(i32::MAX), None))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn save_replaces_in_place() {
        let store = MemoryStore::new();
        let users = store.user_repository();
        let mut user = users.create(new_user("alpha1")).await.unwrap();

        user.email = UserEmail::parse("new@example.com").unwrap();
        users.save(user.clone()).await.unwrap();

        let stored = users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_str(), "new@example.com");
        assert_eq!(users.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn character_requires_existing_owner_and_species() {
        let store = MemoryStore::new();
        let characters = store.character_repository();

        let result = characters
            .create(new_character("Chewbacca", UserId::new(42), None))
            .await;
        assert!(matches!(result, Err(RepositoryError::ReferenceViolation { .. })));

        let owner = store.user_repository().create(new_user("alpha1")).await.unwrap();
        let result = characters
            .create(new_character("Chewbacca", owner.id, Some(SpeciesId::new(9))))
            .await;
        assert!(matches!(result, Err(RepositoryError::ReferenceViolation { .. })));
    }

    #[tokio::test]
    async fn delete_is_restricted_while_referenced() {
        let store = MemoryStore::new();
        let users = store.user_repository();
        let species = store.species_repository();
        let characters = store.character_repository();

        let owner = users.create(new_user("alpha1")).await.unwrap();
        let wookiee = species.create(new_species("Wookiee")).await.unwrap();
        let chewie = characters
            .create(new_character("Chewbacca", owner.id, Some(wookiee.id)))
            .await
            .unwrap();

        assert!(matches!(
            users.delete_by_id(owner.id).await,
            Err(RepositoryError::ReferenceViolation { .. })
        ));
        assert!(matches!(
            species.delete_by_id(wookiee.id).await,
            Err(RepositoryError::ReferenceViolation { .. })
        ));

        characters.delete_by_id(chewie.id).await.unwrap();
        users.delete_by_id(owner.id).await.unwrap();
        species.delete_by_id(wookiee.id).await.unwrap();
        assert!(matches!(
            users.delete_by_id(owner.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn queries_return_ascending_ids() {
        let store = MemoryStore::new();
        let owner = store.user_repository().create(new_user("alpha1")).await.unwrap();
        let characters = store.character_repository();

        for _ in 0..3 {
            characters
                .create(new_character("Han Solo", owner.id, None))
                .await
                .unwrap();
        }

        let found = characters.find_by_name("Han Solo").await.unwrap();
        let ids: Vec<i32> = found.iter().map(|character| character.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(characters.find_by_name("Leia").await.unwrap().is_empty());
        assert_eq!(characters.find_by_owner_id(owner.id).await.unwrap().len(), 3);
    }
}

use std::sync::Arc;

use application::{CharacterRepository, SpeciesRepository, UserRepository};
use async_trait::async_trait;
use domain::{
    Character, CharacterId, CharacterName, ImageUrl, NewCharacter, NewSpecies, NewUser,
    PasswordHash, RepositoryError, Species, SpeciesId, SpeciesName, User, UserEmail, UserId,
    Username,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

/// 唯一约束与外键约束冲突映射为对应的仓储错误，其余视为存储故障
fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return RepositoryError::conflict(db_err.message());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::reference_violation(db_err.message());
        }
    }
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: i32,
    username: String,
    email: String,
    password_hash: String,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username = Username::parse(value.username).map_err(|err| invalid_data(err.to_string()))?;
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            username,
            email,
            password,
        })
    }
}

#[derive(Debug, FromRow)]
struct CharacterRecord {
    id: i32,
    name: String,
    image_url: Option<String>,
    owner_id: i32,
    species_id: Option<i32>,
}

impl TryFrom<CharacterRecord> for Character {
    type Error = RepositoryError;

    fn try_from(value: CharacterRecord) -> Result<Self, Self::Error> {
        let name = CharacterName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        let image_url =
            ImageUrl::parse_optional(value.image_url).map_err(|err| invalid_data(err.to_string()))?;

        Ok(Character {
            id: CharacterId::from(value.id),
            name,
            image_url,
            owner_id: UserId::from(value.owner_id),
            species_id: value.species_id.map(SpeciesId::from),
        })
    }
}

#[derive(Debug, FromRow)]
struct SpeciesRecord {
    id: i32,
    species_name: String,
    description: String,
}

impl TryFrom<SpeciesRecord> for Species {
    type Error = RepositoryError;

    fn try_from(value: SpeciesRecord) -> Result<Self, Self::Error> {
        let species_name =
            SpeciesName::parse(value.species_name).map_err(|err| invalid_data(err.to_string()))?;

        Species::new(SpeciesId::from(value.id), species_name, value.description)
            .map_err(|err| invalid_data(err.to_string()))
    }
}

/// 显式 id 写入不会推进 identity 序列；最大 id 超过序列当前值时把序列前移，
/// 保证后续 `create` 不会撞上已有主键，且序列从不后退
async fn sync_identity(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    table: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(&format!(
        r#"
        SELECT setval(seq, max_id)
        FROM (
            SELECT pg_get_serial_sequence('{table}', 'id') AS seq,
                   (SELECT MAX(id) FROM {table}) AS max_id
        ) s
        WHERE max_id > COALESCE(pg_sequence_last_value(seq::regclass), 0)
        "#
    ))
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_err)?;
    Ok(())
}

const USER_COLUMNS: &str = "id, username, email, password_hash";
const CHARACTER_COLUMNS: &str = "id, name, image_url, owner_id, species_id";
const SPECIES_COLUMNS: &str = "id, species_name, description";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        tx.commit().await.map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn save(&self, user: User) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id.value())
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        sync_identity(&mut tx, "users").await?;
        tx.commit().await.map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }

    async fn delete_by_id(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.value())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await.map_err(map_sqlx_err)
    }
}

#[derive(Clone)]
pub struct PgCharacterRepository {
    pool: PgPool,
}

impl PgCharacterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(
        &self,
        condition: &str,
        value: i32,
    ) -> Result<Vec<Character>, RepositoryError> {
        let records = sqlx::query_as::<_, CharacterRecord>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE {condition} ORDER BY id"
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Character::try_from).collect()
    }
}

#[async_trait]
impl CharacterRepository for PgCharacterRepository {
    async fn create(&self, character: NewCharacter) -> Result<Character, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let record = sqlx::query_as::<_, CharacterRecord>(&format!(
            r#"
            INSERT INTO characters (name, image_url, owner_id, species_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {CHARACTER_COLUMNS}
            "#
        ))
        .bind(character.name.as_str())
        .bind(character.image_url.as_ref().map(|url| url.as_str()))
        .bind(character.owner_id.value())
        .bind(character.species_id.map(SpeciesId::value))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        tx.commit().await.map_err(map_sqlx_err)?;

        Character::try_from(record)
    }

    async fn save(&self, character: Character) -> Result<Character, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let record = sqlx::query_as::<_, CharacterRecord>(&format!(
            r#"
            INSERT INTO characters (id, name, image_url, owner_id, species_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                image_url = EXCLUDED.image_url,
                owner_id = EXCLUDED.owner_id,
                species_id = EXCLUDED.species_id
            RETURNING {CHARACTER_COLUMNS}
            "#
        ))
        .bind(character.id.value())
        .bind(character.name.as_str())
        .bind(character.image_url.as_ref().map(|url| url.as_str()))
        .bind(character.owner_id.value())
        .bind(character.species_id.map(SpeciesId::value))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        sync_identity(&mut tx, "characters").await?;
        tx.commit().await.map_err(map_sqlx_err)?;

        Character::try_from(record)
    }

    async fn find_by_id(&self, id: CharacterId) -> Result<Option<Character>, RepositoryError> {
        Ok(self.fetch_where("id = $1", id.value()).await?.into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<Character>, RepositoryError> {
        let records = sqlx::query_as::<_, CharacterRecord>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Character::try_from).collect()
    }

    async fn find_by_owner_id(&self, owner_id: UserId) -> Result<Vec<Character>, RepositoryError> {
        self.fetch_where("owner_id = $1", owner_id.value()).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Character>, RepositoryError> {
        let records = sqlx::query_as::<_, CharacterRecord>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE name = $1 ORDER BY id"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Character::try_from).collect()
    }

    async fn find_by_species_id(
        &self,
        species_id: SpeciesId,
    ) -> Result<Vec<Character>, RepositoryError> {
        self.fetch_where("species_id = $1", species_id.value()).await
    }

    async fn delete_by_id(&self, id: CharacterId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let result = sqlx::query("DELETE FROM characters WHERE id = $1")
            .bind(id.value())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await.map_err(map_sqlx_err)
    }
}

#[derive(Clone)]
pub struct PgSpeciesRepository {
    pool: PgPool,
}

impl PgSpeciesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpeciesRepository for PgSpeciesRepository {
    async fn create(&self, species: NewSpecies) -> Result<Species, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let record = sqlx::query_as::<_, SpeciesRecord>(&format!(
            "INSERT INTO species (species_name, description) VALUES ($1, $2) RETURNING {SPECIES_COLUMNS}"
        ))
        .bind(species.species_name.as_str())
        .bind(&species.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        tx.commit().await.map_err(map_sqlx_err)?;

        Species::try_from(record)
    }

    async fn save(&self, species: Species) -> Result<Species, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let record = sqlx::query_as::<_, SpeciesRecord>(&format!(
            r#"
            INSERT INTO species (id, species_name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET species_name = EXCLUDED.species_name,
                description = EXCLUDED.description
            RETURNING {SPECIES_COLUMNS}
            "#
        ))
        .bind(species.id.value())
        .bind(species.species_name.as_str())
        .bind(&species.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        sync_identity(&mut tx, "species").await?;
        tx.commit().await.map_err(map_sqlx_err)?;

        Species::try_from(record)
    }

    async fn find_by_id(&self, id: SpeciesId) -> Result<Option<Species>, RepositoryError> {
        let record = sqlx::query_as::<_, SpeciesRecord>(&format!(
            "SELECT {SPECIES_COLUMNS} FROM species WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Species::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Species>, RepositoryError> {
        let records = sqlx::query_as::<_, SpeciesRecord>(&format!(
            "SELECT {SPECIES_COLUMNS} FROM species ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Species::try_from).collect()
    }

    async fn find_by_species_name(&self, name: &str) -> Result<Option<Species>, RepositoryError> {
        let record = sqlx::query_as::<_, SpeciesRecord>(&format!(
            "SELECT {SPECIES_COLUMNS} FROM species WHERE species_name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Species::try_from).transpose()
    }

    async fn delete_by_id(&self, id: SpeciesId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let result = sqlx::query("DELETE FROM species WHERE id = $1")
            .bind(id.value())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await.map_err(map_sqlx_err)
    }
}

/// 共享同一连接池的 PostgreSQL 仓储集合
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub character_repository: Arc<PgCharacterRepository>,
    pub species_repository: Arc<PgSpeciesRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            character_repository: Arc::new(PgCharacterRepository::new(pool.clone())),
            species_repository: Arc::new(PgSpeciesRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

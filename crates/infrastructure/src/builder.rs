use std::sync::Arc;

use application::{CharacterRepository, PasswordHasher, SpeciesRepository, UserRepository};
use config::{AppConfig, StorageBackend};
use thiserror::Error;
use tracing::info;

use crate::{
    memory::MemoryStore,
    migrations::MIGRATOR,
    password::BcryptPasswordHasher,
    repository::{create_pg_pool, PgStorage},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 按端口类型擦除后的仓储集合，供应用层服务装配
#[derive(Clone)]
pub struct Storage {
    pub user_repository: Arc<dyn UserRepository>,
    pub character_repository: Arc<dyn CharacterRepository>,
    pub species_repository: Arc<dyn SpeciesRepository>,
}

impl From<PgStorage> for Storage {
    fn from(storage: PgStorage) -> Self {
        Self {
            user_repository: storage.user_repository,
            character_repository: storage.character_repository,
            species_repository: storage.species_repository,
        }
    }
}

impl From<MemoryStore> for Storage {
    fn from(store: MemoryStore) -> Self {
        Self {
            user_repository: Arc::new(store.user_repository()),
            character_repository: Arc::new(store.character_repository()),
            species_repository: Arc::new(store.species_repository()),
        }
    }
}

#[derive(Clone)]
pub struct Infrastructure {
    pub storage: Storage,
    pub password_hasher: Arc<BcryptPasswordHasher>,
}

impl Infrastructure {
    /// 根据配置选择存储后端；PostgreSQL 后端会先执行迁移
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let storage = match config.storage.backend {
            StorageBackend::Postgres => {
                let pool =
                    create_pg_pool(&config.database.url, config.database.max_connections).await?;
                MIGRATOR.run(&pool).await?;
                info!("connected to postgres, migrations applied");
                Storage::from(PgStorage::new(pool))
            }
            StorageBackend::Memory => {
                info!("using in-memory storage");
                Storage::from(MemoryStore::new())
            }
        };

        Ok(Self {
            storage,
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.security.bcrypt_cost)),
        })
    }

    pub fn in_memory(bcrypt_cost: Option<u32>) -> Self {
        Self {
            storage: Storage::from(MemoryStore::new()),
            password_hasher: Arc::new(BcryptPasswordHasher::new(bcrypt_cost)),
        }
    }

    pub fn password_hasher_trait(&self) -> Arc<dyn PasswordHasher> {
        self.password_hasher.clone()
    }
}

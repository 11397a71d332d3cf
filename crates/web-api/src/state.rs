use std::sync::Arc;

use application::{
    CharacterService, CharacterServiceDependencies, SpeciesService, SpeciesServiceDependencies,
    UserService, UserServiceDependencies,
};
use config::AppConfig;
use domain::PasswordPolicy;
use infrastructure::Infrastructure;

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub character_service: Arc<CharacterService>,
    pub species_service: Arc<SpeciesService>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        character_service: Arc<CharacterService>,
        species_service: Arc<SpeciesService>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_service,
            character_service,
            species_service,
            jwt_service,
        }
    }

    /// 用基础设施适配器装配全部服务
    pub fn from_infrastructure(infrastructure: &Infrastructure, config: &AppConfig) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let storage = &infrastructure.storage;

        let user_service = UserService::new(UserServiceDependencies {
            user_repository: storage.user_repository.clone(),
            password_hasher: infrastructure.password_hasher_trait(),
            token_issuer: jwt_service.clone(),
            password_policy: PasswordPolicy::new(config.security.password_min_length),
        });
        let character_service = CharacterService::new(CharacterServiceDependencies {
            character_repository: storage.character_repository.clone(),
        });
        let species_service = SpeciesService::new(SpeciesServiceDependencies {
            species_repository: storage.species_repository.clone(),
        });

        Self::new(
            Arc::new(user_service),
            Arc::new(character_service),
            Arc::new(species_service),
            jwt_service,
        )
    }
}

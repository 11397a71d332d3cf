mod character_service;
mod species_service;
mod user_service;

#[cfg(test)]
mod test_support;

pub use character_service::{
    CharacterService, CharacterServiceDependencies, CreateCharacterRequest,
    UpdateCharacterRequest,
};
pub use species_service::{
    CreateSpeciesRequest, SpeciesService, SpeciesServiceDependencies, UpdateSpeciesRequest,
};
pub use user_service::{
    RegisterUserRequest, UpdateUserRequest, UserService, UserServiceDependencies,
};

//! 角色管理游戏服务的核心领域模型
//!
//! 包含用户、角色、种族等实体，经过校验的值对象，以及领域/仓储错误定义。

pub mod character;
pub mod credentials;
pub mod errors;
pub mod species;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use character::{Character, NewCharacter};
pub use credentials::Credentials;
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use species::{NewSpecies, Species};
pub use user::{NewUser, User};
pub use value_objects::{
    CharacterId, CharacterName, ImageUrl, PasswordHash, PasswordPolicy, SpeciesId, SpeciesName,
    UserEmail, UserId, Username,
};

//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、未找到语义，
//! 以及对外部适配器（持久化、密码哈希、会话令牌签发）的抽象。

pub mod clock;
pub mod error;
pub mod lookup;
pub mod password;
pub mod repository;
pub mod services;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ApplicationError;
pub use lookup::Lookup;
pub use password::{PasswordHasher, PasswordHasherError};
pub use repository::{CharacterRepository, SpeciesRepository, UserRepository};
pub use services::{
    CharacterService, CharacterServiceDependencies, SpeciesService, SpeciesServiceDependencies,
    UserService, UserServiceDependencies,
};
pub use token::{Session, TokenError, TokenIssuer};

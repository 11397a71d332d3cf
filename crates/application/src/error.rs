use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::{password::PasswordHasherError, token::TokenError};

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("authentication failed")]
    Authentication,
    #[error("authorization failed")]
    Authorization,
}

impl ApplicationError {
    /// 是否属于“未找到”类错误（实体查询未命中或删除目标不存在）
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(
                DomainError::UserNotFound
                    | DomainError::CharacterNotFound
                    | DomainError::SpeciesNotFound
            ) | ApplicationError::Repository(RepositoryError::NotFound)
        )
    }
}

//! 领域模型错误定义

use thiserror::Error;

/// 领域模型错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 参数不满足领域约束
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("user not found")]
    UserNotFound,

    #[error("character not found")]
    CharacterNotFound,

    #[error("species not found")]
    SpeciesNotFound,
}

impl DomainError {
    /// 创建参数校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 持久化层错误
///
/// 唯一约束、外键约束等由存储层负责检查，并以对应变体返回给上层。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// 唯一约束冲突（用户名、邮箱、种族名）
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// 外键约束冲突：引用的实体不存在，或删除时仍有依赖
    #[error("reference violation: {message}")]
    ReferenceViolation { message: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn reference_violation(message: impl Into<String>) -> Self {
        Self::ReferenceViolation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

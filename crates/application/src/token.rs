//! 会话令牌签发端口
//!
//! 认证成功后必须签发令牌才能返回会话响应；认证失败绝不签发。

use domain::User;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to issue token: {0}")]
    Issue(String),
    #[error("invalid token: {0}")]
    Invalid(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    /// 对给定时钟而言，结果只取决于用户身份
    fn issue_token(&self, user: &User) -> Result<String, TokenError>;
}

/// 登录成功后的会话
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

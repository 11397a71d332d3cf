//! 用户实体定义

use serde::Serialize;

use crate::value_objects::{PasswordHash, UserEmail, UserId, Username};

/// 已持久化的用户
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: UserEmail,
    #[serde(skip_serializing)] // 密码哈希不暴露给客户端
    pub password: PasswordHash,
}

/// 尚未分配主键的用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Username,
    pub email: UserEmail,
    pub password: PasswordHash,
}

impl NewUser {
    pub fn new(username: Username, email: UserEmail, password: PasswordHash) -> Self {
        Self {
            username,
            email,
            password,
        }
    }

    pub fn with_id(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password: self.password,
        }
    }
}

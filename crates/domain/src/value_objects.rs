use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{ValidateEmail, ValidateUrl};

use crate::errors::DomainError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            pub fn new(id: i32) -> Self {
                Self(id)
            }

            pub fn value(self) -> i32 {
                self.0
            }

            /// 数据库分配的主键总是正数
            pub fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

entity_id!(
    /// 用户唯一标识。
    UserId
);
entity_id!(
    /// 角色唯一标识。
    CharacterId
);
entity_id!(
    /// 种族唯一标识。
    SpeciesId
);

/// 经过验证的用户名：字母开头，仅含字母数字，至少 5 个字符。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub const MIN_LEN: usize = 5;
    pub const MAX_LEN: usize = 50;

    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::invalid_argument("username", "cannot be blank"));
        }
        if value.len() < Self::MIN_LEN {
            return Err(DomainError::invalid_argument(
                "username",
                format!("must be at least {} characters", Self::MIN_LEN),
            ));
        }
        if value.len() > Self::MAX_LEN {
            return Err(DomainError::invalid_argument("username", "too long"));
        }
        if !value.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(DomainError::invalid_argument(
                "username",
                "must start with a letter",
            ));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid_argument(
                "username",
                "may only contain letters and digits",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 经过验证的邮箱地址。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserEmail(String);

impl UserEmail {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(DomainError::invalid_argument("email", "cannot be blank"));
        }
        if !value.validate_email() {
            return Err(DomainError::invalid_argument("email", "is not a valid address"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 经过外部服务生成的密码哈希。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let hash = value.into();
        if hash.trim().is_empty() {
            return Err(DomainError::invalid_argument(
                "password_hash",
                "cannot be empty",
            ));
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(***)")
    }
}

/// 明文密码强度规则。
///
/// 规则本身由配置决定：最小长度，且至少包含一个字母和一个数字。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordPolicy {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    pub fn check(&self, plaintext: &str) -> Result<(), DomainError> {
        if plaintext.trim().is_empty() {
            return Err(DomainError::invalid_argument("password", "cannot be blank"));
        }
        if plaintext.chars().count() < self.min_length {
            return Err(DomainError::invalid_argument(
                "password",
                format!("must be at least {} characters", self.min_length),
            ));
        }
        let has_letter = plaintext.chars().any(|c| c.is_alphabetic());
        let has_digit = plaintext.chars().any(|c| c.is_ascii_digit());
        if !(has_letter && has_digit) {
            return Err(DomainError::invalid_argument(
                "password",
                "must contain at least one letter and one digit",
            ));
        }
        Ok(())
    }
}

/// 角色名称，至少 2 个字符。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterName(String);

impl CharacterName {
    pub const MIN_LEN: usize = 2;
    pub const MAX_LEN: usize = 100;

    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be blank"));
        }
        let len = trimmed.chars().count();
        if len < Self::MIN_LEN {
            return Err(DomainError::invalid_argument(
                "name",
                format!("must be at least {} characters", Self::MIN_LEN),
            ));
        }
        if len > Self::MAX_LEN {
            return Err(DomainError::invalid_argument("name", "too long"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 角色头像地址。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageUrl(String);

impl ImageUrl {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        if !value.validate_url() {
            return Err(DomainError::invalid_argument("image_url", "is not a valid URL"));
        }
        Ok(Self(value))
    }

    /// 空字符串视为未设置
    pub fn parse_optional(value: Option<String>) -> Result<Option<Self>, DomainError> {
        match value {
            Some(url) if !url.trim().is_empty() => Self::parse(url).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 种族名称（唯一）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesName(String);

impl SpeciesName {
    pub const MAX_LEN: usize = 100;

    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(DomainError::invalid_argument("species_name", "cannot be blank"));
        }
        if value.chars().count() > Self::MAX_LEN {
            return Err(DomainError::invalid_argument("species_name", "too long"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

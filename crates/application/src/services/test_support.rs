//! 服务单元测试共用的替身对象

use async_trait::async_trait;
use domain::{
    Character, CharacterId, CharacterName, PasswordHash, SpeciesId, User, UserEmail, UserId,
    Username,
};

use crate::password::{PasswordHasher, PasswordHasherError};

/// 可预测的“哈希”：加前缀，便于断言
pub struct PrefixHasher;

#[async_trait]
impl PasswordHasher for PrefixHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("hashed:{plaintext}"))
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("hashed:{plaintext}"))
    }
}

pub fn sample_user(id: i32, username: &str, password: &str) -> User {
    User {
        id: UserId::new(id),
        username: Username::parse(username).unwrap(),
        email: UserEmail::parse(format!("{username}@example.com")).unwrap(),
        password: PasswordHash::new(format!("hashed:{password}")).unwrap(),
    }
}

pub fn sample_character(id: i32, name: &str, owner: i32, species: Option<i32>) -> Character {
    Character {
        id: CharacterId::new(id),
        name: CharacterName::parse(name).unwrap(),
        image_url: None,
        owner_id: UserId::new(owner),
        species_id: species.map(SpeciesId::new),
    }
}

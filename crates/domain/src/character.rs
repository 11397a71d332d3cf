//! 角色实体定义
//!
//! 每个角色必须归属于且仅归属于一个用户，可选地关联一个种族。

use serde::Serialize;

use crate::value_objects::{CharacterId, CharacterName, ImageUrl, SpeciesId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: CharacterName,
    pub image_url: Option<ImageUrl>,
    /// 所属用户（必填）
    pub owner_id: UserId,
    /// 所属种族（可选）
    pub species_id: Option<SpeciesId>,
}

impl Character {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}

/// 尚未分配主键的角色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCharacter {
    pub name: CharacterName,
    pub image_url: Option<ImageUrl>,
    pub owner_id: UserId,
    pub species_id: Option<SpeciesId>,
}

impl NewCharacter {
    pub fn new(
        name: CharacterName,
        image_url: Option<ImageUrl>,
        owner_id: UserId,
        species_id: Option<SpeciesId>,
    ) -> Self {
        Self {
            name,
            image_url,
            owner_id,
            species_id,
        }
    }

    pub fn with_id(self, id: CharacterId) -> Character {
        Character {
            id,
            name: self.name,
            image_url: self.image_url,
            owner_id: self.owner_id,
            species_id: self.species_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_is_by_owner_id() {
        let character = NewCharacter::new(
            CharacterName::parse("Chewbacca").unwrap(),
            None,
            UserId::new(1),
            Some(SpeciesId::new(3)),
        )
        .with_id(CharacterId::new(10));

        assert!(character.is_owned_by(UserId::new(1)));
        assert!(!character.is_owned_by(UserId::new(2)));

        let json = serde_json::to_value(&character).unwrap();
        assert_eq!(json["owner_id"], 1);
        assert_eq!(json["species_id"], 3);
        assert!(json["image_url"].is_null());
    }
}

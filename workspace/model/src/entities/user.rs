use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Represents a registered user of the board.
/// A user owns the adverts it posts.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique, indexed, column_type = "String(StringLen::N(50))")]
    pub name: String,
    /// Argon2 PHC string. Never part of any projection.
    pub password: String,
    #[sea_orm(column_type = "String(StringLen::N(100))", nullable)]
    pub email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    // A user can own multiple adverts.
    #[sea_orm(has_many = "super::advert::Entity")]
    Advert,
}

impl Related<super::advert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Advert.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Public JSON projection of a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserJson {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
}

impl Model {
    pub fn to_json(&self) -> UserJson {
        UserJson {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

use chrono::{SubsecRound, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use super::user;

/// A classified advert posted by a user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "advert")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    /// Assigned on insert, whole seconds only.
    pub created_at: DateTimeUtc,
    /// The user who posted this advert.
    pub owner_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An advert belongs to one owner.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(Utc::now().trunc_subsecs(0));
        }
        Ok(self)
    }
}

/// Public JSON projection of an advert, with the owner flattened to its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdvertJson {
    pub id: i32,
    pub title: String,
    pub note: Option<String>,
    /// Unix timestamp in seconds.
    pub created_at: i64,
    /// Name of the owning user.
    pub owner: String,
}

impl Model {
    /// Projects this advert using an already loaded owner.
    pub fn to_json(&self, owner: &user::Model) -> AdvertJson {
        AdvertJson {
            id: self.id,
            title: self.title.clone(),
            note: self.note.clone(),
            created_at: self.created_at.timestamp(),
            owner: owner.name.clone(),
        }
    }

    /// Resolves the owner relation, then projects.
    ///
    /// Every advert references an existing user, so a missing owner is
    /// reported as `DbErr::RecordNotFound` rather than papered over.
    pub async fn load_json<C>(&self, db: &C) -> Result<AdvertJson, DbErr>
    where
        C: ConnectionTrait,
    {
        match self.find_related(user::Entity).one(db).await? {
            Some(owner) => Ok(self.to_json(&owner)),
            None => {
                error!(
                    "Advert {} references missing owner {}",
                    self.id, self.owner_id
                );
                Err(DbErr::RecordNotFound(format!(
                    "owner {} of advert {}",
                    self.owner_id, self.id
                )))
            }
        }
    }
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Absent until an OAuth-created account picks one
    #[sea_orm(unique)]
    pub username: Option<String>,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Null for external-identity accounts
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>,
    #[serde(skip_serializing)]
    #[sea_orm(unique)]
    pub google_id: Option<String>,
    pub is_admin: bool,
    pub banned: bool,
    /// The single outstanding refresh token; cleared on logout/revocation
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::question::Entity")]
    Questions,
    #[sea_orm(has_many = "super::answer::Entity")]
    Answers,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

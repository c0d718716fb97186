use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    /// answer | vote | accept | mention | announcement
    pub kind: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub read: bool,
    pub link: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Notification categories surfaced to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Answer,
    Vote,
    Accept,
    Mention,
    Announcement,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Answer => "answer",
            NotificationKind::Vote => "vote",
            NotificationKind::Accept => "accept",
            NotificationKind::Mention => "mention",
            NotificationKind::Announcement => "announcement",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "answer" => Some(NotificationKind::Answer),
            "vote" => Some(NotificationKind::Vote),
            "accept" => Some(NotificationKind::Accept),
            "mention" => Some(NotificationKind::Mention),
            "announcement" => Some(NotificationKind::Announcement),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

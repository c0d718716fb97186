use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    /// Rich text, stored opaque
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub author_id: i64,
    /// Must reference an answer of this question when set
    pub accepted_answer_id: Option<i64>,
    /// Cached tally; the votes table is the source of truth
    pub votes: i32,
    pub views: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
    #[sea_orm(has_many = "super::answer::Entity")]
    Answers,
    #[sea_orm(has_many = "super::question_tag::Entity")]
    Tags,
    #[sea_orm(has_many = "super::question_flag::Entity")]
    Flags,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::question_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl Related<super::question_flag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

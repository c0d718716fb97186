//! Migration: Create question_flags table

use sea_orm_migration::prelude::*;

use super::m20260715_000001_create_users::Users;
use super::m20260715_000002_create_questions::Questions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuestionFlags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionFlags::QuestionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionFlags::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionFlags::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // Composite key doubles as the one-flag-per-user constraint
                    .primary_key(
                        Index::create()
                            .col(QuestionFlags::QuestionId)
                            .col(QuestionFlags::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_flags_question")
                            .from(QuestionFlags::Table, QuestionFlags::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_flags_user")
                            .from(QuestionFlags::Table, QuestionFlags::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(QuestionFlags::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
pub enum QuestionFlags {
    Table,
    #[iden = "question_id"]
    QuestionId,
    #[iden = "user_id"]
    UserId,
    #[iden = "created_at"]
    CreatedAt,
}

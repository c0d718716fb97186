//! Migration: Create questions table

use sea_orm_migration::prelude::*;

use super::m20260715_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::Title).string().not_null())
                    .col(ColumnDef::new(Questions::Description).text().not_null())
                    .col(ColumnDef::new(Questions::AuthorId).big_integer().not_null())
                    // No FK: answers table does not exist yet (mutual reference)
                    .col(
                        ColumnDef::new(Questions::AcceptedAnswerId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Questions::Votes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Questions::Views)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Questions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Questions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_author")
                            .from(Questions::Table, Questions::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_questions_author")
                    .table(Questions::Table)
                    .col(Questions::AuthorId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_questions_created")
                    .table(Questions::Table)
                    .col(Questions::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Questions::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Questions {
    Table,
    Id,
    Title,
    Description,
    #[iden = "author_id"]
    AuthorId,
    #[iden = "accepted_answer_id"]
    AcceptedAnswerId,
    Votes,
    Views,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

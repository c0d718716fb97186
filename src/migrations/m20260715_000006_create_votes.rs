//! Migration: Create votes table (the vote ledger)

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
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Votes::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Votes::TargetId).big_integer().not_null())
                    .col(ColumnDef::new(Votes::TargetKind).string().not_null())
                    .col(ColumnDef::new(Votes::Direction).string().not_null())
                    .col(
                        ColumnDef::new(Votes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_user")
                            .from(Votes::Table, Votes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One active vote per (user, target, kind); constraint violations on
        // insert are the authoritative duplicate-vote signal
        manager
            .create_index(
                Index::create()
                    .name("idx_votes_user_target")
                    .table(Votes::Table)
                    .col(Votes::UserId)
                    .col(Votes::TargetId)
                    .col(Votes::TargetKind)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_votes_target")
                    .table(Votes::Table)
                    .col(Votes::TargetId)
                    .col(Votes::TargetKind)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votes::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Votes {
    Table,
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "target_id"]
    TargetId,
    #[iden = "target_kind"]
    TargetKind,
    Direction,
    #[iden = "created_at"]
    CreatedAt,
}

pub use sea_orm_migration::prelude::*;

mod m20260715_000001_create_users;
mod m20260715_000002_create_questions;
mod m20260715_000003_create_answers;
mod m20260715_000004_create_question_tags;
mod m20260715_000005_create_question_flags;
mod m20260715_000006_create_votes;
mod m20260715_000007_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260715_000001_create_users::Migration),
            Box::new(m20260715_000002_create_questions::Migration),
            Box::new(m20260715_000003_create_answers::Migration),
            Box::new(m20260715_000004_create_question_tags::Migration),
            Box::new(m20260715_000005_create_question_flags::Migration),
            Box::new(m20260715_000006_create_votes::Migration),
            Box::new(m20260715_000007_create_notifications::Migration),
        ]
    }
}

//! Migration smoke tests

use sea_orm::{ConnectionTrait, Database, Statement};
use sea_orm_migration::MigratorTrait;

use quorum::migrations::Migrator;

#[tokio::test]
async fn test_migrations_apply_on_fresh_database() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    // All tables exist and are queryable
    for table in [
        "users",
        "questions",
        "answers",
        "question_tags",
        "question_flags",
        "votes",
        "notifications",
    ] {
        let stmt = Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) FROM {}", table),
        );
        db.query_one(stmt)
            .await
            .unwrap_or_else(|e| panic!("table {} missing: {}", table, e));
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    // Re-running must be a no-op, not an error
    Migrator::up(&db, None).await.unwrap();
}

#[tokio::test]
async fn test_votes_unique_index_is_enforced_at_storage_layer() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let backend = db.get_database_backend();
    let insert_user = Statement::from_string(
        backend,
        "INSERT INTO users (username, name, email, is_admin, banned, created_at) \
         VALUES ('u', 'U', 'u@x.com', 0, 0, CURRENT_TIMESTAMP)"
            .to_string(),
    );
    db.execute(insert_user).await.unwrap();

    let insert_vote = "INSERT INTO votes (user_id, target_id, target_kind, direction, created_at) \
                       VALUES (1, 1, 'question', 'up', CURRENT_TIMESTAMP)";
    db.execute(Statement::from_string(backend, insert_vote.to_string()))
        .await
        .unwrap();

    // Identical compound key must violate the unique index
    let err = db
        .execute(Statement::from_string(backend, insert_vote.to_string()))
        .await;
    assert!(err.is_err());
}

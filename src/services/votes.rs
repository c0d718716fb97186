//! Vote ledger
//!
//! Keeps at most one vote per (user, target) and the target's cached tally
//! consistent with the ledger. The ledger write and the tally increment run
//! in one transaction; the unique index on the ledger is the authority on
//! duplicate-vote races.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

use crate::error::{AppError, Result};
use crate::models::notification::NotificationKind;
use crate::models::prelude::*;
use crate::models::vote::{TargetKind, VoteDirection};
use crate::models::{answer, question, user, vote};
use crate::services::notify;
use crate::state::DbConn;

/// Updated target after a successful vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub target_id: i64,
    pub target_kind: TargetKind,
    pub votes: i32,
}

struct TargetMeta {
    owner_id: i64,
    link: String,
}

/// Cast, flip, or reject a vote and return the target's fresh tally.
///
/// - no prior vote: insert a ledger row, tally +1/-1
/// - same direction again: Conflict, nothing changes
/// - opposite direction: flip the row, tally +/-2
pub async fn cast_vote(
    db: &DbConn,
    actor: &user::Model,
    target_id: i64,
    target_kind: TargetKind,
    direction: VoteDirection,
) -> Result<VoteOutcome> {
    let meta = load_target(db, target_id, target_kind).await?;

    let txn = db.begin().await?;

    let existing = Vote::find()
        .filter(vote::Column::UserId.eq(actor.id))
        .filter(vote::Column::TargetId.eq(target_id))
        .filter(vote::Column::TargetKind.eq(target_kind.as_str()))
        .one(&txn)
        .await?;

    let delta = match existing {
        None => {
            let row = vote::ActiveModel {
                user_id: Set(actor.id),
                target_id: Set(target_id),
                target_kind: Set(target_kind.as_str().to_string()),
                direction: Set(direction.as_str().to_string()),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            if let Err(e) = row.insert(&txn).await {
                // A double submit can race past the check above; the unique
                // index rejects the second insert and we report the conflict
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(AppError::Conflict(format!(
                        "You have already voted on this {}",
                        target_kind
                    )));
                }
                return Err(e.into());
            }
            direction.delta()
        }
        Some(v) if v.direction == direction.as_str() => {
            return Err(AppError::Conflict(format!(
                "You have already {}voted this {}",
                direction, target_kind
            )));
        }
        Some(v) => {
            // Flip: remove the old lean and apply the new one in one step
            let mut active: vote::ActiveModel = v.into();
            active.direction = Set(direction.as_str().to_string());
            active.update(&txn).await?;
            2 * direction.delta()
        }
    };

    apply_tally_delta(&txn, target_id, target_kind, delta).await?;
    let votes = read_tally(&txn, target_id, target_kind).await?;

    txn.commit().await?;

    if actor.id != meta.owner_id {
        let who = actor
            .username
            .clone()
            .unwrap_or_else(|| actor.name.clone());
        let verb = match direction {
            VoteDirection::Up => "upvoted",
            VoteDirection::Down => "downvoted",
        };
        let message = format!("{} {} your {}", who, verb, target_kind);
        if let Err(e) = notify::notify_user(
            db,
            meta.owner_id,
            NotificationKind::Vote,
            &message,
            Some(&meta.link),
        )
        .await
        {
            tracing::warn!("Failed to create vote notification: {}", e);
        }
    }

    Ok(VoteOutcome {
        target_id,
        target_kind,
        votes,
    })
}

/// Remove all ledger rows for one target (used when the target is deleted)
pub async fn delete_ledger_for_target<C: ConnectionTrait>(
    conn: &C,
    target_id: i64,
    target_kind: TargetKind,
) -> Result<()> {
    Vote::delete_many()
        .filter(vote::Column::TargetId.eq(target_id))
        .filter(vote::Column::TargetKind.eq(target_kind.as_str()))
        .exec(conn)
        .await?;
    Ok(())
}

/// Remove ledger rows for a batch of answers (question-delete cascade)
pub async fn delete_ledger_for_answers<C: ConnectionTrait>(
    conn: &C,
    answer_ids: &[i64],
) -> Result<()> {
    if answer_ids.is_empty() {
        return Ok(());
    }
    Vote::delete_many()
        .filter(vote::Column::TargetKind.eq(TargetKind::Answer.as_str()))
        .filter(vote::Column::TargetId.is_in(answer_ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(())
}

async fn load_target<C: ConnectionTrait>(
    conn: &C,
    target_id: i64,
    target_kind: TargetKind,
) -> Result<TargetMeta> {
    match target_kind {
        TargetKind::Question => {
            let q = Question::find_by_id(target_id)
                .one(conn)
                .await?
                .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
            Ok(TargetMeta {
                owner_id: q.author_id,
                link: format!("/questions/{}", q.id),
            })
        }
        TargetKind::Answer => {
            let a = Answer::find_by_id(target_id)
                .one(conn)
                .await?
                .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;
            Ok(TargetMeta {
                owner_id: a.author_id,
                link: format!("/questions/{}", a.question_id),
            })
        }
    }
}

/// Atomic `votes = votes + delta`; never read-modify-write of the cache
async fn apply_tally_delta<C: ConnectionTrait>(
    conn: &C,
    target_id: i64,
    target_kind: TargetKind,
    delta: i32,
) -> Result<()> {
    match target_kind {
        TargetKind::Question => {
            Question::update_many()
                .col_expr(
                    question::Column::Votes,
                    Expr::col(question::Column::Votes).add(delta),
                )
                .filter(question::Column::Id.eq(target_id))
                .exec(conn)
                .await?;
        }
        TargetKind::Answer => {
            Answer::update_many()
                .col_expr(
                    answer::Column::Votes,
                    Expr::col(answer::Column::Votes).add(delta),
                )
                .filter(answer::Column::Id.eq(target_id))
                .exec(conn)
                .await?;
        }
    }
    Ok(())
}

async fn read_tally<C: ConnectionTrait>(
    conn: &C,
    target_id: i64,
    target_kind: TargetKind,
) -> Result<i32> {
    match target_kind {
        TargetKind::Question => Ok(Question::find_by_id(target_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?
            .votes),
        TargetKind::Answer => Ok(Answer::find_by_id(target_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?
            .votes),
    }
}

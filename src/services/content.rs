//! Content deletion cascades, shared by the owner-facing and admin routes.
//!
//! Deleting content must also drop its ledger rows so the vote ledger never
//! references a missing target.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};

use crate::error::Result;
use crate::models::prelude::*;
use crate::models::vote::TargetKind;
use crate::models::{answer, question, question_flag, question_tag};
use crate::services::votes;
use crate::state::DbConn;

/// Delete a question and everything hanging off it: answers, their ledger
/// rows, the question's own ledger rows, flags, and tags.
pub async fn delete_question(db: &DbConn, question: question::Model) -> Result<()> {
    let txn = db.begin().await?;

    let answer_ids: Vec<i64> = Answer::find()
        .select_only()
        .column(answer::Column::Id)
        .filter(answer::Column::QuestionId.eq(question.id))
        .into_tuple()
        .all(&txn)
        .await?;

    votes::delete_ledger_for_answers(&txn, &answer_ids).await?;
    votes::delete_ledger_for_target(&txn, question.id, TargetKind::Question).await?;

    Answer::delete_many()
        .filter(answer::Column::QuestionId.eq(question.id))
        .exec(&txn)
        .await?;
    QuestionFlag::delete_many()
        .filter(question_flag::Column::QuestionId.eq(question.id))
        .exec(&txn)
        .await?;
    QuestionTag::delete_many()
        .filter(question_tag::Column::QuestionId.eq(question.id))
        .exec(&txn)
        .await?;

    question.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Delete an answer, its ledger rows, and the parent's accepted-answer
/// reference when it pointed here.
pub async fn delete_answer(db: &DbConn, answer: answer::Model) -> Result<()> {
    let txn = db.begin().await?;

    votes::delete_ledger_for_target(&txn, answer.id, TargetKind::Answer).await?;

    let parent = Question::find_by_id(answer.question_id).one(&txn).await?;
    if let Some(parent) = parent {
        if parent.accepted_answer_id == Some(answer.id) {
            let mut active: question::ActiveModel = parent.into();
            active.accepted_answer_id = Set(None);
            active.update(&txn).await?;
        }
    }

    answer.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

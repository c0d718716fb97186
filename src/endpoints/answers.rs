use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use validator::Validate;

use crate::endpoints::extractors::AuthUser;
use crate::error::{AppError, Result};
use crate::models::notification::NotificationKind;
use crate::models::prelude::*;
use crate::models::vote::{TargetKind, VoteDirection};
use crate::models::{answer, user};
use crate::schemas::{AnswerResponse, UserSummary};
use crate::services::{cast_vote, content, notify};
use crate::state::AppState;

/// Create answer routes
pub fn answers_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_answer))
        .route("/question/{question_id}", get(list_answers))
        .route("/{id}", put(update_answer).delete(delete_answer))
        .route("/{id}/upvote", post(upvote_answer))
        .route("/{id}/downvote", post(downvote_answer))
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnswerRequest {
    pub question_id: i64,
    #[validate(length(min = 1, message = "Answer body is required"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAnswerRequest {
    #[validate(length(min = 1, message = "Answer body is required"))]
    pub body: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Post an answer to an existing question
async fn create_answer(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateAnswerRequest>,
) -> Result<Response> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let parent = Question::find_by_id(request.question_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    let now = Utc::now();
    let new_answer = answer::ActiveModel {
        question_id: Set(parent.id),
        author_id: Set(actor.id),
        body: Set(request.body),
        votes: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_answer.insert(&state.db).await?;

    if parent.author_id != actor.id {
        let who = actor.username.clone().unwrap_or_else(|| actor.name.clone());
        let message = format!("{} answered your question \"{}\"", who, parent.title);
        let link = format!("/questions/{}", parent.id);
        if let Err(e) = notify::notify_user(
            &state.db,
            parent.author_id,
            NotificationKind::Answer,
            &message,
            Some(&link),
        )
        .await
        {
            tracing::warn!("Failed to create answer notification: {}", e);
        }
    }

    let response = build_answer_response(&state.db, created, parent.accepted_answer_id).await?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// All answers for a question, newest first
async fn list_answers(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> Result<Json<Vec<AnswerResponse>>> {
    let parent = Question::find_by_id(question_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    let answers = Answer::find()
        .filter(answer::Column::QuestionId.eq(question_id))
        .order_by_desc(answer::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let author_ids: Vec<i64> = answers.iter().map(|a| a.author_id).collect();
    let authors: HashMap<i64, UserSummary> = User::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(&state.db)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    let responses = answers
        .into_iter()
        .map(|a| {
            let author = authors.get(&a.author_id).cloned();
            let accepted = parent.accepted_answer_id == Some(a.id);
            AnswerResponse::from_model(a, author, accepted)
        })
        .collect();

    Ok(Json(responses))
}

/// Edit an answer (author only)
async fn update_answer(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAnswerRequest>,
) -> Result<Json<AnswerResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let found = Answer::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

    if found.author_id != actor.id {
        return Err(AppError::Forbidden(
            "Only the author can edit this answer".to_string(),
        ));
    }

    let mut active: answer::ActiveModel = found.into();
    active.body = Set(request.body);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    let accepted = Question::find_by_id(updated.question_id)
        .one(&state.db)
        .await?
        .and_then(|q| q.accepted_answer_id);

    let response = build_answer_response(&state.db, updated, accepted).await?;
    Ok(Json(response))
}

/// Delete an answer (author or admin)
async fn delete_answer(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let found = Answer::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

    if found.author_id != actor.id && !actor.is_admin {
        return Err(AppError::Forbidden(
            "Only the author or an admin can delete this answer".to_string(),
        ));
    }

    content::delete_answer(&state.db, found).await?;

    Ok(Json(serde_json::json!({ "message": "Answer deleted" })))
}

async fn upvote_answer(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AnswerResponse>> {
    vote_on_answer(&state, &actor, id, VoteDirection::Up).await
}

async fn downvote_answer(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AnswerResponse>> {
    vote_on_answer(&state, &actor, id, VoteDirection::Down).await
}

async fn vote_on_answer(
    state: &AppState,
    actor: &user::Model,
    id: i64,
    direction: VoteDirection,
) -> Result<Json<AnswerResponse>> {
    cast_vote(&state.db, actor, id, TargetKind::Answer, direction).await?;

    let fresh = Answer::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

    let accepted = Question::find_by_id(fresh.question_id)
        .one(&state.db)
        .await?
        .and_then(|q| q.accepted_answer_id);

    let response = build_answer_response(&state.db, fresh, accepted).await?;
    Ok(Json(response))
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn build_answer_response<C: ConnectionTrait>(
    conn: &C,
    answer: answer::Model,
    accepted_answer_id: Option<i64>,
) -> Result<AnswerResponse> {
    let author = User::find_by_id(answer.author_id)
        .one(conn)
        .await?
        .map(UserSummary::from);
    let accepted = accepted_answer_id == Some(answer.id);
    Ok(AnswerResponse::from_model(answer, author, accepted))
}

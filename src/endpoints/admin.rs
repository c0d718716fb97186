use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::endpoints::extractors::AdminUser;
use crate::endpoints::questions::build_question_list;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::vote::TargetKind;
use crate::models::{question_flag, user};
use crate::schemas::{QuestionResponse, UserResponse};
use crate::services::{content, notify};
use crate::state::AppState;

/// Create admin routes; every handler requires the admin role
pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/ban", put(ban_user))
        .route("/users/{id}/unban", put(unban_user))
        .route("/users/{id}/role", put(set_role))
        .route("/questions/{id}", delete(delete_question))
        .route("/answers/{id}", delete(delete_answer))
        .route("/stats", get(stats))
        .route("/flagged-content", get(flagged_content))
        .route("/content/{kind}/{id}", put(clear_flags).delete(delete_content))
        .route("/notify-all", post(notify_all))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub users: u64,
    pub questions: u64,
    pub answers: u64,
}

#[derive(Debug, Serialize)]
pub struct FlaggedContentItem {
    pub question: QuestionResponse,
    pub flags: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NotifyAllRequest {
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    pub link: Option<String>,
}

// ============================================================================
// User Moderation
// ============================================================================

async fn list_users(
    State(state): State<AppState>,
    _auth: AdminUser,
) -> Result<Json<Vec<UserResponse>>> {
    let users = User::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Ban an account; also revokes its outstanding refresh token
async fn ban_user(
    State(state): State<AppState>,
    _auth: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let found = User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = found.into();
    active.banned = Set(true);
    active.refresh_token = Set(None);
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}

async fn unban_user(
    State(state): State<AppState>,
    _auth: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let found = User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = found.into();
    active.banned = Set(false);
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}

/// Grant or revoke the admin role. The forum must always keep at least one
/// admin, so revoking the last one is rejected.
async fn set_role(
    State(state): State<AppState>,
    _auth: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<UserResponse>> {
    let found = User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !request.is_admin && found.is_admin {
        let admin_count = User::find()
            .filter(user::Column::IsAdmin.eq(true))
            .count(&state.db)
            .await?;
        if admin_count <= 1 {
            return Err(AppError::Conflict(
                "Cannot remove the last remaining admin".to_string(),
            ));
        }
    }

    let mut active: user::ActiveModel = found.into();
    active.is_admin = Set(request.is_admin);
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}

// ============================================================================
// Content Moderation
// ============================================================================

async fn delete_question(
    State(state): State<AppState>,
    _auth: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let found = Question::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    content::delete_question(&state.db, found).await?;

    Ok(Json(serde_json::json!({ "message": "Question deleted" })))
}

async fn delete_answer(
    State(state): State<AppState>,
    _auth: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let found = Answer::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

    content::delete_answer(&state.db, found).await?;

    Ok(Json(serde_json::json!({ "message": "Answer deleted" })))
}

/// Generic moderation delete for the flagged-content view
async fn delete_content(
    State(state): State<AppState>,
    auth: AdminUser,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<serde_json::Value>> {
    match TargetKind::parse(&kind) {
        Some(TargetKind::Question) => delete_question(State(state), auth, Path(id)).await,
        Some(TargetKind::Answer) => delete_answer(State(state), auth, Path(id)).await,
        None => Err(AppError::BadRequest(format!(
            "Unknown content kind: {}",
            kind
        ))),
    }
}

/// Dismiss a flagged question: clear its flag set
async fn clear_flags(
    State(state): State<AppState>,
    _auth: AdminUser,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<serde_json::Value>> {
    if TargetKind::parse(&kind) != Some(TargetKind::Question) {
        return Err(AppError::BadRequest(
            "Only questions carry flags".to_string(),
        ));
    }

    let found = Question::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    QuestionFlag::delete_many()
        .filter(question_flag::Column::QuestionId.eq(found.id))
        .exec(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "message": "Flags cleared" })))
}

/// Flagged questions with their flag counts, most-flagged first
async fn flagged_content(
    State(state): State<AppState>,
    _auth: AdminUser,
) -> Result<Json<Vec<FlaggedContentItem>>> {
    let rows: Vec<(i64, i64)> = QuestionFlag::find()
        .select_only()
        .column(question_flag::Column::QuestionId)
        .column_as(question_flag::Column::UserId.count(), "count")
        .group_by(question_flag::Column::QuestionId)
        .order_by_desc(question_flag::Column::UserId.count())
        .into_tuple()
        .all(&state.db)
        .await?;

    if rows.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
    let questions = Question::find()
        .filter(crate::models::question::Column::Id.is_in(ids))
        .all(&state.db)
        .await?;

    let mut by_id: HashMap<i64, QuestionResponse> = build_question_list(&state.db, questions)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    let items = rows
        .into_iter()
        .filter_map(|(id, count)| {
            by_id.remove(&id).map(|question| FlaggedContentItem {
                question,
                flags: count as u64,
            })
        })
        .collect();

    Ok(Json(items))
}

// ============================================================================
// Stats & Broadcast
// ============================================================================

async fn stats(State(state): State<AppState>, _auth: AdminUser) -> Result<Json<StatsResponse>> {
    let users = User::find().count(&state.db).await?;
    let questions = Question::find().count(&state.db).await?;
    let answers = Answer::find().count(&state.db).await?;

    Ok(Json(StatsResponse {
        users,
        questions,
        answers,
    }))
}

/// Broadcast an announcement: one notification row per user
async fn notify_all(
    State(state): State<AppState>,
    _auth: AdminUser,
    Json(request): Json<NotifyAllRequest>,
) -> Result<Json<serde_json::Value>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let notified =
        notify::broadcast_to_all(&state.db, &request.message, request.link.as_deref()).await?;

    Ok(Json(serde_json::json!({ "notified": notified })))
}

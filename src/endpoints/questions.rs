use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Query as SeaQuery};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::Deserialize;
use validator::Validate;

use crate::endpoints::extractors::AuthUser;
use crate::error::{AppError, Result};
use crate::models::notification::NotificationKind;
use crate::models::prelude::*;
use crate::models::vote::{TargetKind, VoteDirection};
use crate::models::{answer, question, question_flag, question_tag, user};
use crate::schemas::{AnswerResponse, QuestionDetailResponse, QuestionResponse, TagCount, UserSummary};
use crate::services::{cast_vote, content, notify};
use crate::state::AppState;

/// Maximum number of tags per question
const MAX_TAGS: usize = 5;

/// Create question routes
pub fn questions_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/tags/popular", get(popular_tags))
        .route(
            "/{id}",
            get(get_question).put(update_question).delete(delete_question),
        )
        .route("/{id}/accept", put(accept_answer))
        .route("/{id}/upvote", post(upvote_question))
        .route("/{id}/downvote", post(downvote_question))
        .route("/{id}/flag", post(flag_question))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ListQuery {
    /// Exact tag filter
    pub tag: Option<String>,
    /// Case-insensitive substring over title/description/tags
    pub search: Option<String>,
    /// newest (default) | votes | views | unanswered
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 5, message = "Provide between 1 and 5 tags"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, max = 5, message = "Provide between 1 and 5 tags"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AcceptAnswerRequest {
    pub answer_id: i64,
}

// ============================================================================
// Listing & Aggregates
// ============================================================================

#[utoipa::path(
    get,
    path = "/questions",
    tag = "Questions",
    params(
        ("tag" = Option<String>, Query, description = "Exact tag filter"),
        ("search" = Option<String>, Query, description = "Free-text search"),
        ("sort" = Option<String>, Query, description = "newest | votes | views | unanswered"),
    ),
    responses(
        (status = 200, body = Vec<QuestionResponse>)
    )
)]
async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<QuestionResponse>>> {
    let mut query = Question::find();

    if let Some(tag) = params.tag.as_deref().filter(|t| !t.is_empty()) {
        let tag = tag.to_lowercase();
        let sub = SeaQuery::select()
            .column(question_tag::Column::QuestionId)
            .from(question_tag::Entity)
            .and_where(Expr::col(question_tag::Column::Tag).eq(tag))
            .to_owned();
        query = query.filter(question::Column::Id.in_subquery(sub));
    }

    if let Some(term) = params.search.as_deref().filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term.to_lowercase());
        let tag_sub = SeaQuery::select()
            .column(question_tag::Column::QuestionId)
            .from(question_tag::Entity)
            .and_where(Expr::col(question_tag::Column::Tag).like(pattern.clone()))
            .to_owned();

        query = query.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col((
                        question::Entity,
                        question::Column::Title,
                    ))))
                    .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col((
                        question::Entity,
                        question::Column::Description,
                    ))))
                    .like(pattern.clone()),
                )
                .add(question::Column::Id.in_subquery(tag_sub)),
        );
    }

    // Secondary key is always newest-first
    query = match params.sort.as_deref().unwrap_or("newest") {
        "votes" => query
            .order_by_desc(question::Column::Votes)
            .order_by_desc(question::Column::CreatedAt),
        "views" => query
            .order_by_desc(question::Column::Views)
            .order_by_desc(question::Column::CreatedAt),
        "unanswered" => {
            let answered = SeaQuery::select()
                .column(answer::Column::QuestionId)
                .from(answer::Entity)
                .to_owned();
            query
                .filter(question::Column::AcceptedAnswerId.is_null())
                .filter(
                    Expr::col((question::Entity, question::Column::Id)).not_in_subquery(answered),
                )
                .order_by_desc(question::Column::CreatedAt)
        }
        _ => query.order_by_desc(question::Column::CreatedAt),
    };

    let questions = query.all(&state.db).await?;
    let responses = build_question_list(&state.db, questions).await?;

    Ok(Json(responses))
}

#[utoipa::path(
    get,
    path = "/questions/tags/popular",
    tag = "Questions",
    responses(
        (status = 200, body = Vec<TagCount>)
    )
)]
async fn popular_tags(State(state): State<AppState>) -> Result<Json<Vec<TagCount>>> {
    let rows: Vec<(String, i64)> = QuestionTag::find()
        .select_only()
        .column(question_tag::Column::Tag)
        .column_as(question_tag::Column::QuestionId.count(), "count")
        .group_by(question_tag::Column::Tag)
        .order_by_desc(question_tag::Column::QuestionId.count())
        .limit(10)
        .into_tuple()
        .all(&state.db)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(tag, count)| TagCount {
                tag,
                count: count as u64,
            })
            .collect(),
    ))
}

// ============================================================================
// CRUD
// ============================================================================

#[utoipa::path(
    get,
    path = "/questions/{id}",
    tag = "Questions",
    params(
        ("id" = i64, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, body = QuestionDetailResponse),
        (status = 404, description = "Question not found")
    )
)]
async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<QuestionDetailResponse>> {
    // Atomic view bump; zero rows touched means the question is gone
    let touched = Question::update_many()
        .col_expr(
            question::Column::Views,
            Expr::col(question::Column::Views).add(1),
        )
        .filter(question::Column::Id.eq(id))
        .exec(&state.db)
        .await?;

    if touched.rows_affected == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let found = Question::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    let detail = build_question_detail(&state.db, found).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/questions",
    tag = "Questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, body = QuestionResponse)
    )
)]
async fn create_question(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<Response> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let tags = normalize_tags(&request.tags)?;

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let new_question = question::ActiveModel {
        title: Set(request.title),
        description: Set(request.description),
        author_id: Set(actor.id),
        accepted_answer_id: Set(None),
        votes: Set(0),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_question.insert(&txn).await?;

    insert_tags(&txn, created.id, &tags).await?;

    txn.commit().await?;

    let response = build_question_response(&state.db, created).await?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

async fn update_question(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateQuestionRequest>,
) -> Result<Json<QuestionResponse>> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let tags = normalize_tags(&request.tags)?;

    let found = Question::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    // Editing is owner-only; admins moderate via delete/flag-clear
    if found.author_id != actor.id {
        return Err(AppError::Forbidden(
            "Only the author can edit this question".to_string(),
        ));
    }

    let txn = state.db.begin().await?;

    let mut active: question::ActiveModel = found.into();
    active.title = Set(request.title);
    active.description = Set(request.description);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    QuestionTag::delete_many()
        .filter(question_tag::Column::QuestionId.eq(id))
        .exec(&txn)
        .await?;
    insert_tags(&txn, id, &tags).await?;

    txn.commit().await?;

    Ok(Json(build_question_response(&state.db, updated).await?))
}

async fn delete_question(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let found = Question::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    if found.author_id != actor.id && !actor.is_admin {
        return Err(AppError::Forbidden(
            "Only the author or an admin can delete this question".to_string(),
        ));
    }

    content::delete_question(&state.db, found).await?;

    Ok(Json(serde_json::json!({ "message": "Question deleted" })))
}

// ============================================================================
// Accept / Vote / Flag
// ============================================================================

async fn accept_answer(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<AcceptAnswerRequest>,
) -> Result<Json<QuestionResponse>> {
    let found = Question::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    if found.author_id != actor.id {
        return Err(AppError::Forbidden(
            "Only the question author can accept an answer".to_string(),
        ));
    }

    let chosen = Answer::find_by_id(request.answer_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

    // The accepted answer must belong to this question
    if chosen.question_id != found.id {
        return Err(AppError::BadRequest(
            "Answer does not belong to this question".to_string(),
        ));
    }

    let question_id = found.id;
    let question_title = found.title.clone();

    let mut active: question::ActiveModel = found.into();
    active.accepted_answer_id = Set(Some(chosen.id));
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    if chosen.author_id != actor.id {
        let message = format!("Your answer to \"{}\" was accepted", question_title);
        let link = format!("/questions/{}", question_id);
        if let Err(e) = notify::notify_user(
            &state.db,
            chosen.author_id,
            NotificationKind::Accept,
            &message,
            Some(&link),
        )
        .await
        {
            tracing::warn!("Failed to create accept notification: {}", e);
        }
    }

    Ok(Json(build_question_response(&state.db, updated).await?))
}

#[utoipa::path(
    post,
    path = "/questions/{id}/upvote",
    tag = "Questions",
    params(
        ("id" = i64, Path, description = "Question ID"),
    ),
    responses(
        (status = 200, body = QuestionResponse),
        (status = 409, description = "Already upvoted")
    )
)]
async fn upvote_question(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<QuestionResponse>> {
    vote_on_question(&state, &actor, id, VoteDirection::Up).await
}

async fn downvote_question(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<QuestionResponse>> {
    vote_on_question(&state, &actor, id, VoteDirection::Down).await
}

async fn vote_on_question(
    state: &AppState,
    actor: &user::Model,
    id: i64,
    direction: VoteDirection,
) -> Result<Json<QuestionResponse>> {
    cast_vote(&state.db, actor, id, TargetKind::Question, direction).await?;

    let fresh = Question::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(build_question_response(&state.db, fresh).await?))
}

async fn flag_question(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let exists = Question::find_by_id(id).one(&state.db).await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let row = question_flag::ActiveModel {
        question_id: Set(id),
        user_id: Set(actor.id),
        created_at: Set(Utc::now()),
    };

    if let Err(e) = row.insert(&state.db).await {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            return Err(AppError::Conflict(
                "You have already flagged this question".to_string(),
            ));
        }
        return Err(e.into());
    }

    Ok(Json(serde_json::json!({ "message": "Question flagged" })))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Trim, lowercase, drop empties, dedup preserving order; 1-5 must remain
fn normalize_tags(tags: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }

    if normalized.is_empty() {
        return Err(AppError::BadRequest("At least one tag is required".to_string()));
    }
    if normalized.len() > MAX_TAGS {
        return Err(AppError::BadRequest(format!(
            "At most {} tags are allowed",
            MAX_TAGS
        )));
    }

    Ok(normalized)
}

async fn insert_tags<C: ConnectionTrait>(conn: &C, question_id: i64, tags: &[String]) -> Result<()> {
    let rows: Vec<question_tag::ActiveModel> = tags
        .iter()
        .map(|tag| question_tag::ActiveModel {
            question_id: Set(question_id),
            tag: Set(tag.clone()),
        })
        .collect();
    QuestionTag::insert_many(rows).exec(conn).await?;
    Ok(())
}

/// Build the list DTOs with three batched lookups instead of per-row queries
pub(crate) async fn build_question_list<C: ConnectionTrait>(
    conn: &C,
    questions: Vec<question::Model>,
) -> Result<Vec<QuestionResponse>> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let author_ids: Vec<i64> = questions.iter().map(|q| q.author_id).collect();

    let authors: HashMap<i64, UserSummary> = User::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(conn)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
    for row in QuestionTag::find()
        .filter(question_tag::Column::QuestionId.is_in(ids.clone()))
        .order_by_asc(question_tag::Column::Tag)
        .all(conn)
        .await?
    {
        tags.entry(row.question_id).or_default().push(row.tag);
    }

    let counts: HashMap<i64, u64> = Answer::find()
        .select_only()
        .column(answer::Column::QuestionId)
        .column_as(answer::Column::Id.count(), "count")
        .filter(answer::Column::QuestionId.is_in(ids))
        .group_by(answer::Column::QuestionId)
        .into_tuple::<(i64, i64)>()
        .all(conn)
        .await?
        .into_iter()
        .map(|(id, count)| (id, count as u64))
        .collect();

    Ok(questions
        .into_iter()
        .map(|q| QuestionResponse {
            id: q.id,
            title: q.title,
            description: q.description,
            author: authors.get(&q.author_id).cloned(),
            tags: tags.remove(&q.id).unwrap_or_default(),
            votes: q.votes,
            views: q.views,
            answer_count: counts.get(&q.id).copied().unwrap_or(0),
            accepted_answer_id: q.accepted_answer_id,
            created_at: q.created_at,
            updated_at: q.updated_at,
        })
        .collect())
}

pub(crate) async fn build_question_response<C: ConnectionTrait>(
    conn: &C,
    question: question::Model,
) -> Result<QuestionResponse> {
    let mut list = build_question_list(conn, vec![question]).await?;
    Ok(list.remove(0))
}

async fn build_question_detail<C: ConnectionTrait>(
    conn: &C,
    question: question::Model,
) -> Result<QuestionDetailResponse> {
    let accepted_answer_id = question.accepted_answer_id;
    let question_response = build_question_response(conn, question.clone()).await?;

    let answers = Answer::find()
        .filter(answer::Column::QuestionId.eq(question.id))
        .order_by_desc(answer::Column::CreatedAt)
        .all(conn)
        .await?;

    let author_ids: Vec<i64> = answers.iter().map(|a| a.author_id).collect();
    let authors: HashMap<i64, UserSummary> = User::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(conn)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    let answers = answers
        .into_iter()
        .map(|a| {
            let author = authors.get(&a.author_id).cloned();
            let accepted = accepted_answer_id == Some(a.id);
            AnswerResponse::from_model(a, author, accepted)
        })
        .collect();

    Ok(QuestionDetailResponse {
        question: question_response,
        answers,
    })
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::endpoints::extractors::AuthUser;
use crate::error::{AppError, Result};
use crate::models::notification;
use crate::models::notification::NotificationKind;
use crate::models::prelude::*;
use crate::schemas::{NotificationPage, NotificationResponse};
use crate::services::notify;
use crate::state::AppState;

pub fn notifications_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_notification))
        .route("/unread-count", get(unread_count))
        .route("/read-all", put(mark_all_as_read))
        .route("/{id}/read", put(mark_as_read))
        .route("/{id}", get(list_for_user).delete(delete_notification))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateNotificationRequest {
    pub user_id: i64,
    /// answer | vote | accept | mention | announcement
    pub kind: String,
    pub message: String,
    pub link: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a notification for another user (the client drives @mentions
/// through this)
async fn create_notification(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<Response> {
    let kind = NotificationKind::parse(&request.kind)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown notification kind: {}", request.kind)))?;

    if request.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message is required".to_string()));
    }

    let recipient = User::find_by_id(request.user_id).one(&state.db).await?;
    if recipient.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let created = notify::notify_user(
        &state.db,
        request.user_id,
        kind,
        &request.message,
        request.link.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(NotificationResponse::from(created))).into_response())
}

#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "Notifications",
    responses(
        (status = 200, body = UnreadCountResponse)
    )
)]
async fn unread_count(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<UnreadCountResponse>> {
    let count = notify::unread_count(&state.db, actor.id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/notifications/{id}",
    tag = "Notifications",
    params(
        ("id" = i64, Path, description = "User ID (own notifications only)"),
        ("limit" = Option<u64>, Query, description = "Page size, default 20, cap 100"),
        ("offset" = Option<u64>, Query, description = "Page offset"),
    ),
    responses(
        (status = 200, body = NotificationPage),
        (status = 403, description = "Not your notifications")
    )
)]
async fn list_for_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<NotificationPage>> {
    if user_id != actor.id {
        return Err(AppError::Forbidden(
            "You can only view your own notifications".to_string(),
        ));
    }

    let limit = query.limit.unwrap_or(20).min(100);
    let offset = query.offset.unwrap_or(0);

    let total = Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .count(&state.db)
        .await?;

    let notifications = Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .order_by_desc(notification::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(NotificationPage {
        notifications: notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
        total,
        limit,
        offset,
    }))
}

#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    tag = "Notifications",
    params(
        ("id" = i64, Path, description = "Notification ID"),
    ),
    responses(
        (status = 200, body = NotificationResponse)
    )
)]
async fn mark_as_read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<NotificationResponse>> {
    let found = Notification::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    if found.user_id != actor.id {
        return Err(AppError::Forbidden(
            "You can only modify your own notifications".to_string(),
        ));
    }

    let mut active: notification::ActiveModel = found.into();
    active.read = Set(true);
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    put,
    path = "/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, body = serde_json::Value)
    )
)]
async fn mark_all_as_read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<serde_json::Value>> {
    Notification::update_many()
        .col_expr(notification::Column::Read, Expr::value(true))
        .filter(notification::Column::UserId.eq(actor.id))
        .filter(notification::Column::Read.eq(false))
        .exec(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "Notifications",
    params(
        ("id" = i64, Path, description = "Notification ID"),
    ),
    responses(
        (status = 200, body = serde_json::Value)
    )
)]
async fn delete_notification(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let found = Notification::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    if found.user_id != actor.id {
        return Err(AppError::Forbidden(
            "You can only delete your own notifications".to_string(),
        ));
    }

    found.delete(&state.db).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

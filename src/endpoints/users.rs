use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};

use crate::endpoints::extractors::AuthUser;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::user;
use crate::schemas::UserResponse;
use crate::state::AppState;

/// Create user routes
pub fn users_routes(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search_users))
        .route("/{id}", get(get_user))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Search result entry; mirrors what the mention picker needs
#[derive(Debug, Serialize)]
pub struct UserSearchResult {
    pub id: i64,
    pub username: Option<String>,
    pub name: String,
    pub email: String,
}

/// Search users by name or username (mention autocomplete)
async fn search_users(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSearchResult>>> {
    let term = query.q.unwrap_or_default();
    if term.len() < 2 {
        return Ok(Json(Vec::new()));
    }

    let pattern = format!("%{}%", term.to_lowercase());

    let users = User::find()
        .filter(user::Column::Banned.eq(false))
        .filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::Name))))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col((
                        user::Entity,
                        user::Column::Username,
                    ))))
                    .like(pattern),
                ),
        )
        .limit(10)
        .all(&state.db)
        .await?;

    Ok(Json(
        users
            .into_iter()
            .map(|u| UserSearchResult {
                id: u.id,
                username: u.username,
                name: u.name,
                email: u.email,
            })
            .collect(),
    ))
}

/// Public profile; never exposes credentials
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let found = User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(found.into()))
}

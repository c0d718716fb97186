use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sea_orm::EntityTrait;

use crate::error::AppError;
use crate::models::prelude::*;
use crate::models::user;
use crate::services::security::decode_access_token;
use crate::state::AppState;

/// Extractor for authenticated users
pub struct AuthUser(pub user::Model);

/// Extractor for admin users
pub struct AdminUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = extract_user_from_token(parts, state).await?;

        match user {
            Some(u) => Ok(AuthUser(u)),
            None => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = extract_user_from_token(parts, state).await?;

        match user {
            Some(u) if u.is_admin => Ok(AdminUser(u)),
            Some(_) => Err(AppError::Forbidden("Admin access required".to_string())),
            None => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}

/// Extract and validate the bearer access token, then load the user.
///
/// Returns Ok(None) for missing/invalid tokens so callers choose the 401;
/// a banned account is rejected outright regardless of token validity.
async fn extract_user_from_token(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<user::Model>, AppError> {
    let token = match parts.headers.get(AUTHORIZATION) {
        Some(header) => {
            let auth_str = header
                .to_str()
                .map_err(|_| AppError::BadRequest("Invalid authorization header".to_string()))?;
            match auth_str.strip_prefix("Bearer ") {
                Some(token) => token.to_string(),
                None => return Ok(None),
            }
        }
        None => return Ok(None),
    };

    let claims = match decode_access_token(&state.config.auth, &token) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };

    let user_id: i64 = match claims.sub.parse() {
        Ok(id) => id,
        Err(_) => return Ok(None),
    };

    let found = User::find_by_id(user_id).one(&state.db).await?;

    match found {
        Some(u) if u.banned => Err(AppError::Forbidden("Account is banned".to_string())),
        other => Ok(other),
    }
}

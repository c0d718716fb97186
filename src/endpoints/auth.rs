use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, Value};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::user;
use crate::schemas::UserResponse;
use crate::services::security::{
    create_access_token, create_refresh_token, decode_access_token, decode_refresh_token,
    hash_password, verify_password,
};
use crate::services::oauth;
use crate::state::AppState;

/// Name of the HTTP-only refresh token cookie
pub const REFRESH_COOKIE_NAME: &str = "quorum_refresh";

/// Create auth routes for registration and session management
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/google", get(google_login))
        .route("/google/callback", get(google_callback))
        .route("/failure", get(google_failure))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid e-mail address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "emailOrUsername")]
    pub email_or_username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

// ============================================================================
// Refresh Cookie Helpers
// ============================================================================

/// Create the refresh cookie with the given token
fn create_refresh_cookie(token: &str, max_age_secs: i64, secure: bool) -> HeaderValue {
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        REFRESH_COOKIE_NAME,
        token,
        max_age_secs,
        if secure { "; Secure" } else { "" }
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Create a cookie that clears the refresh token
fn clear_refresh_cookie() -> HeaderValue {
    let cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        REFRESH_COOKIE_NAME
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Extract the refresh token from the cookie header
fn extract_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?;
    let cookie_str = cookies.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(&format!("{}=", REFRESH_COOKIE_NAME)) {
            return Some(value.to_string());
        }
    }
    None
}

/// Issue the access/refresh pair, persist the refresh token on the user row
async fn issue_tokens(state: &AppState, user: &user::Model) -> Result<(String, String)> {
    let access_token = create_access_token(&state.config.auth, user)?;
    let refresh_token = create_refresh_token(&state.config.auth, user.id)?;

    let mut active: user::ActiveModel = user.clone().into();
    active.refresh_token = Set(Some(refresh_token.clone()));
    active.update(&state.db).await?;

    Ok((access_token, refresh_token))
}

// ============================================================================
// Registration & Login
// ============================================================================

/// Register a new account, returning an access token and setting the
/// refresh cookie
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let exists = User::find()
        .filter(
            user::Column::Email
                .eq(&request.email)
                .or(user::Column::Username.eq(&request.username)),
        )
        .one(&state.db)
        .await?;

    if exists.is_some() {
        return Err(AppError::Conflict(
            "E-mail or username already in use".to_string(),
        ));
    }

    let hashed = hash_password(&request.password)?;

    let new_user = user::ActiveModel {
        username: Set(Some(request.username)),
        name: Set(request.name),
        email: Set(request.email),
        hashed_password: Set(Some(hashed)),
        google_id: Set(None),
        is_admin: Set(false),
        banned: Set(false),
        refresh_token: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_user.insert(&state.db).await?;

    let (access_token, refresh_token) = issue_tokens(&state, &created).await?;

    let response = Json(AuthResponse {
        access_token,
        user: created.into(),
    });

    Ok((
        StatusCode::CREATED,
        [(
            header::SET_COOKIE,
            create_refresh_cookie(
                &refresh_token,
                state.config.auth.refresh_ttl_secs,
                state.config.auth.cookie_secure,
            ),
        )],
        response,
    )
        .into_response())
}

/// Login with e-mail or username
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    let found_user = User::find()
        .filter(
            user::Column::Email
                .eq(&request.email_or_username)
                .or(user::Column::Username.eq(&request.email_or_username)),
        )
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    // Banned wins over everything, even a correct password
    if found_user.banned {
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    // External-identity accounts have no password to check
    let hash = found_user
        .hashed_password
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&request.password, hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let (access_token, refresh_token) = issue_tokens(&state, &found_user).await?;

    let response = Json(AuthResponse {
        access_token,
        user: found_user.into(),
    });

    Ok((
        [(
            header::SET_COOKIE,
            create_refresh_cookie(
                &refresh_token,
                state.config.auth.refresh_ttl_secs,
                state.config.auth.cookie_secure,
            ),
        )],
        response,
    )
        .into_response())
}

// ============================================================================
// Session Endpoints
// ============================================================================

/// Current user via access token, falling back to the refresh cookie
async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<MeResponse>> {
    // Bearer access token first
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(String::from);

    let user_id: i64 = if let Some(token) = bearer {
        let claims = decode_access_token(&state.config.auth, &token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?
    } else {
        // Refresh cookie fallback; the cookie must also match the stored
        // value so server-side revocation sticks
        let token = extract_refresh_cookie(&headers)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
        let claims = decode_refresh_token(&state.config.auth, &token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

        let stored = User::find_by_id(user_id).one(&state.db).await?;
        match stored {
            Some(ref u) if u.refresh_token.as_deref() == Some(token.as_str()) => user_id,
            _ => {
                return Err(AppError::Unauthorized(
                    "Session invalid. Please log in again.".to_string(),
                ))
            }
        }
    };

    let found_user = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if found_user.banned {
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    Ok(Json(MeResponse {
        user: found_user.into(),
    }))
}

/// Mint a fresh access token from the refresh cookie
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>> {
    let token = extract_refresh_cookie(&headers)
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let claims = decode_refresh_token(&state.config.auth, &token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

    let found_user = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    // Cross-check against the stored value; a cleared or rotated token
    // forces a fresh login
    if found_user.refresh_token.as_deref() != Some(token.as_str()) {
        return Err(AppError::Unauthorized(
            "Invalid or expired refresh token".to_string(),
        ));
    }

    if found_user.banned {
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    let access_token = create_access_token(&state.config.auth, &found_user)?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Logout: revoke the stored refresh token and clear the cookie
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    if let Some(token) = extract_refresh_cookie(&headers) {
        User::update_many()
            .col_expr(user::Column::RefreshToken, Expr::value(Value::String(None)))
            .filter(user::Column::RefreshToken.eq(token))
            .exec(&state.db)
            .await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_refresh_cookie())],
    )
        .into_response())
}

// ============================================================================
// Google OAuth Flow
// ============================================================================

/// Redirect the browser to Google's authorization page
async fn google_login(State(state): State<AppState>) -> Result<Redirect> {
    let url = oauth::authorize_url(&state.config.oauth)?;
    Ok(Redirect::temporary(&url))
}

/// Handle the provider callback: exchange the code, find or create the
/// user, and send the browser back to the client with a success flag
/// (never a token in the URL)
async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OauthCallbackQuery>,
) -> Result<Response> {
    let code = match (query.code, query.error) {
        (Some(code), None) => code,
        (_, error) => {
            tracing::warn!("Google callback error: {:?}", error);
            return Ok(Redirect::to("/auth/failure").into_response());
        }
    };

    let tokens = oauth::exchange_code(&state.config.oauth, &code).await?;
    let profile = oauth::fetch_userinfo(&tokens.access_token).await?;

    let found_user = find_or_create_google_user(&state, &profile).await?;

    if found_user.banned {
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    let (_, refresh_token) = issue_tokens(&state, &found_user).await?;

    let target = format!("{}?auth=success", state.config.frontend_url);

    Ok((
        [(
            header::SET_COOKIE,
            create_refresh_cookie(
                &refresh_token,
                state.config.auth.refresh_ttl_secs,
                state.config.auth.cookie_secure,
            ),
        )],
        Redirect::to(&target),
    )
        .into_response())
}

/// Terminal endpoint for failed provider logins
async fn google_failure() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "detail": "Google login failed" })),
    )
        .into_response()
}

/// Look up by Google id; link by e-mail for existing local accounts;
/// otherwise create a fresh password-less user
async fn find_or_create_google_user(
    state: &AppState,
    profile: &oauth::GoogleUserInfo,
) -> Result<user::Model> {
    let existing = User::find()
        .filter(user::Column::GoogleId.eq(&profile.sub))
        .one(&state.db)
        .await?;
    if let Some(u) = existing {
        return Ok(u);
    }

    if let Some(email) = &profile.email {
        let by_email = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&state.db)
            .await?;
        if let Some(u) = by_email {
            let mut active: user::ActiveModel = u.into();
            active.google_id = Set(Some(profile.sub.clone()));
            return Ok(active.update(&state.db).await?);
        }
    }

    let email = profile
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("Google account has no e-mail".to_string()))?;

    let new_user = user::ActiveModel {
        username: Set(None),
        name: Set(profile.name.clone().unwrap_or_else(|| email.clone())),
        email: Set(email),
        hashed_password: Set(None),
        google_id: Set(Some(profile.sub.clone())),
        is_admin: Set(false),
        banned: Set(false),
        refresh_token: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    Ok(new_user.insert(&state.db).await?)
}

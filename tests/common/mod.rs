//! Test helpers and utilities for integration testing.
//!
//! Provides an in-memory database, a ready-to-use application state, and
//! request helpers shared by the endpoint test suites.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tower::util::ServiceExt;

use quorum::config::auth::AuthConfig;
use quorum::config::database::DatabaseConfig;
use quorum::config::oauth::OauthConfig;
use quorum::config::server::ServerConfig;
use quorum::config::Config;
use quorum::endpoints::create_router;
use quorum::migrations::Migrator;
use quorum::models::user;
use quorum::services::security::{create_access_token, hash_password};
use quorum::state::AppState;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    // Use simple in-memory SQLite - each connection gets its own database
    let db_url = "sqlite::memory:";

    let db = Database::connect(db_url)
        .await
        .expect("Failed to create test database");

    // Run migrations using the Migrator
    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Deterministic configuration for tests
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: Vec::new(),
        },
        database: DatabaseConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 5,
        },
        auth: AuthConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604800,
            cookie_secure: false,
        },
        oauth: OauthConfig {
            google_client_id: None,
            google_client_secret: None,
            google_redirect_uri: "http://localhost:5000/auth/google/callback".to_string(),
        },
        log_level: "info".to_string(),
        frontend_url: "http://localhost:3000".to_string(),
    }
}

/// Build an application state around a test database
pub fn build_app_state(db: DatabaseConnection) -> AppState {
    AppState::new(db, test_config())
}

/// Create a test user and return the user model
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> user::Model {
    create_user_with_flags(db, username, email, password, false, false).await
}

/// Create a test admin user
pub async fn create_test_admin(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> user::Model {
    create_user_with_flags(db, username, email, password, true, false).await
}

/// Create a banned test user
pub async fn create_banned_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> user::Model {
    create_user_with_flags(db, username, email, password, false, true).await
}

async fn create_user_with_flags(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
    is_admin: bool,
    banned: bool,
) -> user::Model {
    let hashed = hash_password(password).unwrap();

    let new_user = user::ActiveModel {
        username: Set(Some(username.to_string())),
        name: Set(username.to_string()),
        email: Set(email.to_string()),
        hashed_password: Set(Some(hashed)),
        google_id: Set(None),
        is_admin: Set(is_admin),
        banned: Set(banned),
        refresh_token: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    new_user.insert(db).await.unwrap()
}

/// Mint a bearer token for a user without going through /auth/login
pub fn access_token_for(state: &AppState, user: &user::Model) -> String {
    create_access_token(&state.config.auth, user).unwrap()
}

/// Fire a request at a fresh router and return (status, json body)
pub async fn do_request(
    state: AppState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let app = create_router(state);

    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::json!({}));

    (status, body)
}

/// POST /auth/login with the supplied credentials.
/// Returns (status, response_body_json, optional_refresh_cookie).
pub async fn do_login(
    state: AppState,
    email_or_username: &str,
    password: &str,
) -> (StatusCode, serde_json::Value, Option<String>) {
    let app = create_router(state);
    let payload =
        serde_json::json!({"emailOrUsername": email_or_username, "password": password}).to_string();

    let request = Request::builder()
        .uri("/auth/login")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(payload))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    // Extract the refresh cookie (quorum_refresh=<token>) before consuming body
    let cookie = response.headers().get_all("set-cookie").iter().find_map(|h| {
        let s = h.to_str().ok()?;
        if s.starts_with("quorum_refresh=") {
            let token = s.strip_prefix("quorum_refresh=")?.splitn(2, ';').next()?;
            Some(format!("quorum_refresh={}", token))
        } else {
            None
        }
    });

    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::json!({}));

    (status, body, cookie)
}

/// Fire a request carrying a Cookie header (refresh flows)
pub async fn do_request_with_cookie(
    state: AppState,
    method: &str,
    uri: &str,
    cookie: &str,
) -> (StatusCode, serde_json::Value) {
    let app = create_router(state);

    let request = Request::builder()
        .uri(uri)
        .method(method)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::json!({}));

    (status, body)
}

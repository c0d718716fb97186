pub mod admin;
pub mod answers;
pub mod auth;
pub mod extractors;
pub mod notifications;
pub mod questions;
pub mod users;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth::auth_routes(state.clone()))
        .nest("/questions", questions::questions_routes(state.clone()))
        .nest("/answers", answers::answers_routes(state.clone()))
        .nest(
            "/notifications",
            notifications::notifications_routes(state.clone()),
        )
        .nest("/admin", admin::admin_routes(state.clone()))
        .nest("/users", users::users_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

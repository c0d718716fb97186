use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::user;

/// Safe public profile: never carries the password hash, refresh token, or
/// external identity id.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: Option<String>,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub banned: bool,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            banned: user.banned,
            created_at: user.created_at,
        }
    }
}

/// Author info embedded in question/answer payloads
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub username: Option<String>,
    pub name: String,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
        }
    }
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }
}

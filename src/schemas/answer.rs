use chrono::{DateTime, Utc};
use serde::Serialize;

use super::user::UserSummary;
use crate::models::answer;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AnswerResponse {
    pub id: i64,
    pub question_id: i64,
    pub author: Option<UserSummary>,
    pub body: String,
    pub votes: i32,
    /// Derived: whether the parent question accepted this answer
    pub accepted: bool,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl AnswerResponse {
    pub fn from_model(
        answer: answer::Model,
        author: Option<UserSummary>,
        accepted: bool,
    ) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            author,
            body: answer.body,
            votes: answer.votes,
            accepted,
            created_at: answer.created_at,
            updated_at: answer.updated_at,
        }
    }
}

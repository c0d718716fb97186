use chrono::{DateTime, Utc};
use serde::Serialize;

use super::answer::AnswerResponse;
use super::user::UserSummary;

/// Question as it appears in list responses
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuestionResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub author: Option<UserSummary>,
    pub tags: Vec<String>,
    pub votes: i32,
    pub views: i32,
    pub answer_count: u64,
    pub accepted_answer_id: Option<i64>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// Question detail with its answers joined in (newest first)
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuestionDetailResponse {
    #[serde(flatten)]
    pub question: QuestionResponse,
    pub answers: Vec<AnswerResponse>,
}

/// Tag with its usage count, for the popular-tags aggregate
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

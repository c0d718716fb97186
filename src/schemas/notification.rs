use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::notification;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub link: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            message: n.message,
            read: n.read,
            link: n.link,
            created_at: n.created_at,
        }
    }
}

/// Offset-paginated notification listing
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NotificationPage {
    pub notifications: Vec<NotificationResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

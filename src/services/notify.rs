//! Notification rows, created as side effects of forum actions.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set,
};

use crate::error::Result;
use crate::models::notification::NotificationKind;
use crate::models::prelude::*;
use crate::models::{notification, user};

/// Insert a notification for one user
pub async fn notify_user<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    kind: NotificationKind,
    message: &str,
    link: Option<&str>,
) -> Result<notification::Model> {
    let row = notification::ActiveModel {
        user_id: Set(user_id),
        kind: Set(kind.as_str().to_string()),
        message: Set(message.to_string()),
        read: Set(false),
        link: Set(link.map(String::from)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(row.insert(conn).await?)
}

/// Insert one announcement row per user; returns how many were created
pub async fn broadcast_to_all<C: ConnectionTrait>(
    conn: &C,
    message: &str,
    link: Option<&str>,
) -> Result<u64> {
    let user_ids: Vec<i64> = User::find()
        .select_only()
        .column(user::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    if user_ids.is_empty() {
        return Ok(0);
    }

    let now = Utc::now();
    let rows: Vec<notification::ActiveModel> = user_ids
        .iter()
        .map(|id| notification::ActiveModel {
            user_id: Set(*id),
            kind: Set(NotificationKind::Announcement.as_str().to_string()),
            message: Set(message.to_string()),
            read: Set(false),
            link: Set(link.map(String::from)),
            created_at: Set(now),
            ..Default::default()
        })
        .collect();

    let count = rows.len() as u64;
    Notification::insert_many(rows).exec(conn).await?;
    Ok(count)
}

/// Unread notification count for a user
pub async fn unread_count<C: ConnectionTrait>(conn: &C, user_id: i64) -> Result<u64> {
    Ok(Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::Read.eq(false))
        .count(conn)
        .await?)
}

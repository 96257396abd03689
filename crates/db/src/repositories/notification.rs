use chrono::{DateTime, Utc};
use eyre::Result;
use learnhub_core::models::notification::NewNotification;
use sqlx::{Pool, Postgres};

use crate::models::DbNotification;

/// Persists a whole batch in a single statement and returns the stored rows.
pub async fn insert_notifications(
    pool: &Pool<Postgres>,
    rows: &[NewNotification],
) -> Result<Vec<DbNotification>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    tracing::debug!("Inserting {} notifications", rows.len());

    let user_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
    let titles: Vec<String> = rows.iter().map(|r| r.title.clone()).collect();
    let messages: Vec<String> = rows.iter().map(|r| r.message.clone()).collect();
    let kinds: Vec<String> = rows.iter().map(|r| r.kind.as_str().to_string()).collect();
    let created: Vec<DateTime<Utc>> = rows.iter().map(|r| r.created_at).collect();
    let expires: Vec<DateTime<Utc>> = rows.iter().map(|r| r.expires_at).collect();

    let stored = sqlx::query_as::<_, DbNotification>(
        r#"
        INSERT INTO notifications (user_id, title, message, kind, created_at, expires_at)
        SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[], $3::TEXT[],
                             $4::VARCHAR[], $5::TIMESTAMPTZ[], $6::TIMESTAMPTZ[])
        RETURNING id, user_id, title, message, kind, created_at, expires_at, is_read
        "#,
    )
    .bind(&user_ids)
    .bind(&titles)
    .bind(&messages)
    .bind(&kinds)
    .bind(&created)
    .bind(&expires)
    .fetch_all(pool)
    .await?;

    Ok(stored)
}

/// Non-expired notifications for a user, newest first.
pub async fn list_for_user(
    pool: &Pool<Postgres>,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<DbNotification>> {
    tracing::debug!("Listing notifications for user: {}", user_id);

    let notifications = sqlx::query_as::<_, DbNotification>(
        r#"
        SELECT id, user_id, title, message, kind, created_at, expires_at, is_read
        FROM notifications
        WHERE user_id = $1 AND expires_at >= $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

pub async fn list_unread_for_user(
    pool: &Pool<Postgres>,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<DbNotification>> {
    let notifications = sqlx::query_as::<_, DbNotification>(
        r#"
        SELECT id, user_id, title, message, kind, created_at, expires_at, is_read
        FROM notifications
        WHERE user_id = $1 AND expires_at >= $2 AND NOT is_read
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

pub async fn get_notification_by_id(
    pool: &Pool<Postgres>,
    id: i64,
) -> Result<Option<DbNotification>> {
    let notification = sqlx::query_as::<_, DbNotification>(
        r#"
        SELECT id, user_id, title, message, kind, created_at, expires_at, is_read
        FROM notifications
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}

pub async fn mark_read(pool: &Pool<Postgres>, id: i64) -> Result<()> {
    tracing::debug!("Marking notification as read: id={}", id);

    sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_notification(pool: &Pool<Postgres>, id: i64) -> Result<()> {
    tracing::debug!("Deleting notification: id={}", id);

    sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Ids of at most `limit` notifications expired as of `now`.
pub async fn expired_ids(pool: &Pool<Postgres>, now: DateTime<Utc>, limit: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id
        FROM notifications
        WHERE expires_at < $1
        ORDER BY id
        LIMIT $2
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

pub async fn delete_by_ids(pool: &Pool<Postgres>, ids: &[i64]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM notifications WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;

    tracing::debug!("Deleted {} notifications", result.rows_affected());
    Ok(result.rows_affected())
}

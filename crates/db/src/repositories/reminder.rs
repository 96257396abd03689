use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};

pub async fn reminder_exists(pool: &Pool<Postgres>, event_id: i64, hours_before: i32) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM event_reminders
            WHERE event_id = $1 AND hours_before = $2
        );
        "#,
    )
    .bind(event_id)
    .bind(hours_before)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Idempotent under the (event_id, hours_before) unique key.
pub async fn record_reminder(
    pool: &Pool<Postgres>,
    event_id: i64,
    hours_before: i32,
    sent_at: DateTime<Utc>,
) -> Result<()> {
    tracing::debug!("Recording reminder: event_id={}, hours_before={}", event_id, hours_before);

    sqlx::query(
        r#"
        INSERT INTO event_reminders (event_id, hours_before, sent_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (event_id, hours_before) DO NOTHING
        "#,
    )
    .bind(event_id)
    .bind(hours_before)
    .bind(sent_at)
    .execute(pool)
    .await?;

    Ok(())
}

use chrono::{DateTime, Utc};
use eyre::Result;
use learnhub_core::models::event::EventRequest;
use sqlx::{Pool, Postgres};

use crate::models::DbEvent;

pub async fn create_event(
    pool: &Pool<Postgres>,
    request: &EventRequest,
    meeting_link: Option<&str>,
) -> Result<DbEvent> {
    tracing::debug!("Creating event: title={}, online={}", request.title, request.online);

    let event = sqlx::query_as::<_, DbEvent>(
        r#"
        INSERT INTO events (title, description, start_time, end_time, online,
                            location, meeting_link, max_participants)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, title, description, start_time, end_time, online,
                  location, meeting_link, max_participants, status, created_at
        "#,
    )
    .bind(&request.title)
    .bind(&request.description)
    .bind(request.start_time)
    .bind(request.end_time)
    .bind(request.online)
    .bind(&request.location)
    .bind(meeting_link)
    .bind(request.max_participants)
    .fetch_one(pool)
    .await?;

    tracing::debug!("Event created successfully: id={}", event.id);
    Ok(event)
}

pub async fn update_event(
    pool: &Pool<Postgres>,
    id: i64,
    request: &EventRequest,
    meeting_link: Option<&str>,
) -> Result<DbEvent> {
    tracing::debug!("Updating event: id={}", id);

    let event = sqlx::query_as::<_, DbEvent>(
        r#"
        UPDATE events
        SET title = $2, description = $3, start_time = $4, end_time = $5,
            online = $6, location = $7, meeting_link = $8, max_participants = $9
        WHERE id = $1
        RETURNING id, title, description, start_time, end_time, online,
                  location, meeting_link, max_participants, status, created_at
        "#,
    )
    .bind(id)
    .bind(&request.title)
    .bind(&request.description)
    .bind(request.start_time)
    .bind(request.end_time)
    .bind(request.online)
    .bind(&request.location)
    .bind(meeting_link)
    .bind(request.max_participants)
    .fetch_one(pool)
    .await?;

    Ok(event)
}

pub async fn delete_event(pool: &Pool<Postgres>, id: i64) -> Result<()> {
    tracing::debug!("Deleting event: id={}", id);

    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_event_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<DbEvent>> {
    tracing::debug!("Getting event by id: {}", id);

    let event = sqlx::query_as::<_, DbEvent>(
        r#"
        SELECT id, title, description, start_time, end_time, online,
               location, meeting_link, max_participants, status, created_at
        FROM events
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(event)
}

/// Offset page of events, newest start first.
pub async fn list_events(pool: &Pool<Postgres>, page: i64, page_size: i64) -> Result<Vec<DbEvent>> {
    tracing::debug!("Listing events: page={}, page_size={}", page, page_size);

    let events = sqlx::query_as::<_, DbEvent>(
        r#"
        SELECT id, title, description, start_time, end_time, online,
               location, meeting_link, max_participants, status, created_at
        FROM events
        ORDER BY start_time DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(page_size)
    .bind(page * page_size)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Events whose persisted status has not reached ENDED.
pub async fn list_active_events(pool: &Pool<Postgres>) -> Result<Vec<DbEvent>> {
    let events = sqlx::query_as::<_, DbEvent>(
        r#"
        SELECT id, title, description, start_time, end_time, online,
               location, meeting_link, max_participants, status, created_at
        FROM events
        WHERE status <> 'ENDED'
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(events)
}

pub async fn set_event_status(pool: &Pool<Postgres>, id: i64, status: &str) -> Result<()> {
    tracing::debug!("Setting event status: id={}, status={}", id, status);

    sqlx::query("UPDATE events SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn events_starting_between(
    pool: &Pool<Postgres>,
    lo: DateTime<Utc>,
    hi: DateTime<Utc>,
) -> Result<Vec<DbEvent>> {
    tracing::debug!("Getting events starting between {} and {}", lo, hi);

    let events = sqlx::query_as::<_, DbEvent>(
        r#"
        SELECT id, title, description, start_time, end_time, online,
               location, meeting_link, max_participants, status, created_at
        FROM events
        WHERE start_time >= $1 AND start_time <= $2
        ORDER BY start_time
        "#,
    )
    .bind(lo)
    .bind(hi)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

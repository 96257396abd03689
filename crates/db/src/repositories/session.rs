use chrono::{DateTime, Utc};
use eyre::Result;
use learnhub_core::models::session::SessionRequest;
use sqlx::{Pool, Postgres};

use crate::models::DbSession;

pub async fn create_session(
    pool: &Pool<Postgres>,
    instructor_id: i64,
    request: &SessionRequest,
    meeting_link: &str,
) -> Result<DbSession> {
    tracing::debug!("Creating session: title={}, instructor_id={}", request.title, instructor_id);

    let session = sqlx::query_as::<_, DbSession>(
        r#"
        INSERT INTO sessions (title, description, start_time, end_time,
                              follower_only, instructor_id, meeting_link)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, description, start_time, end_time, follower_only,
                  instructor_id, meeting_link, status, created_at
        "#,
    )
    .bind(&request.title)
    .bind(&request.description)
    .bind(request.start_time)
    .bind(request.end_time)
    .bind(request.follower_only)
    .bind(instructor_id)
    .bind(meeting_link)
    .fetch_one(pool)
    .await?;

    tracing::debug!("Session created successfully: id={}", session.id);
    Ok(session)
}

pub async fn update_session(
    pool: &Pool<Postgres>,
    id: i64,
    request: &SessionRequest,
) -> Result<DbSession> {
    tracing::debug!("Updating session: id={}", id);

    let session = sqlx::query_as::<_, DbSession>(
        r#"
        UPDATE sessions
        SET title = $2, description = $3, start_time = $4, end_time = $5,
            follower_only = $6
        WHERE id = $1
        RETURNING id, title, description, start_time, end_time, follower_only,
                  instructor_id, meeting_link, status, created_at
        "#,
    )
    .bind(id)
    .bind(&request.title)
    .bind(&request.description)
    .bind(request.start_time)
    .bind(request.end_time)
    .bind(request.follower_only)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

pub async fn delete_session(pool: &Pool<Postgres>, id: i64) -> Result<()> {
    tracing::debug!("Deleting session: id={}", id);

    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_session_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<DbSession>> {
    tracing::debug!("Getting session by id: {}", id);

    let session = sqlx::query_as::<_, DbSession>(
        r#"
        SELECT id, title, description, start_time, end_time, follower_only,
               instructor_id, meeting_link, status, created_at
        FROM sessions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Sessions whose persisted status has not reached ENDED.
pub async fn list_active_sessions(pool: &Pool<Postgres>) -> Result<Vec<DbSession>> {
    let sessions = sqlx::query_as::<_, DbSession>(
        r#"
        SELECT id, title, description, start_time, end_time, follower_only,
               instructor_id, meeting_link, status, created_at
        FROM sessions
        WHERE status <> 'ENDED'
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

pub async fn set_session_status(pool: &Pool<Postgres>, id: i64, status: &str) -> Result<()> {
    tracing::debug!("Setting session status: id={}, status={}", id, status);

    sqlx::query("UPDATE sessions SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

    Ok(())
}

/// Sessions a user may see: public ones plus follower-only sessions of
/// instructors the user follows.
pub async fn list_sessions_visible_to(pool: &Pool<Postgres>, user_id: i64) -> Result<Vec<DbSession>> {
    tracing::debug!("Listing sessions visible to user: {}", user_id);

    let sessions = sqlx::query_as::<_, DbSession>(
        r#"
        SELECT s.id, s.title, s.description, s.start_time, s.end_time, s.follower_only,
               s.instructor_id, s.meeting_link, s.status, s.created_at
        FROM sessions s
        WHERE NOT s.follower_only
           OR EXISTS (
                SELECT 1
                FROM follows f
                WHERE f.instructor_id = s.instructor_id AND f.follower_id = $1
           )
        ORDER BY s.start_time
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

/// Whether the instructor already has a session overlapping `[start, end)`,
/// excluding `exclude_id` (the session being updated, if any).
pub async fn has_overlapping_session(
    pool: &Pool<Postgres>,
    instructor_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let overlaps = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM sessions
            WHERE instructor_id = $1
              AND start_time < $3
              AND end_time > $2
              AND ($4::BIGINT IS NULL OR id <> $4)
        );
        "#,
    )
    .bind(instructor_id)
    .bind(start)
    .bind(end)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(overlaps)
}

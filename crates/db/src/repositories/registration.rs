use chrono::{DateTime, Utc};
use eyre::Result;
use learnhub_engine::ports::CheckInClaim;
use sqlx::{Pool, Postgres};

use crate::models::{DbAttendanceRow, DbEvent, DbEventRegistration};

pub async fn create_registration(
    pool: &Pool<Postgres>,
    event_id: i64,
    user_id: i64,
) -> Result<DbEventRegistration> {
    tracing::debug!("Registering user {} for event {}", user_id, event_id);

    let registration = sqlx::query_as::<_, DbEventRegistration>(
        r#"
        INSERT INTO event_registrations (event_id, user_id)
        VALUES ($1, $2)
        RETURNING id, event_id, user_id, checked_in, check_in_time, created_at
        "#,
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(registration)
}

pub async fn delete_registration(pool: &Pool<Postgres>, event_id: i64, user_id: i64) -> Result<u64> {
    tracing::debug!("Cancelling registration: event_id={}, user_id={}", event_id, user_id);

    let result = sqlx::query("DELETE FROM event_registrations WHERE event_id = $1 AND user_id = $2")
        .bind(event_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn get_registration(
    pool: &Pool<Postgres>,
    event_id: i64,
    user_id: i64,
) -> Result<Option<DbEventRegistration>> {
    let registration = sqlx::query_as::<_, DbEventRegistration>(
        r#"
        SELECT id, event_id, user_id, checked_in, check_in_time, created_at
        FROM event_registrations
        WHERE event_id = $1 AND user_id = $2
        "#,
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(registration)
}

pub async fn registrant_ids(pool: &Pool<Postgres>, event_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT user_id
        FROM event_registrations
        WHERE event_id = $1
        ORDER BY user_id
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

pub async fn registration_count(pool: &Pool<Postgres>, event_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Atomically flips the `checked_in` flag for a registration.
///
/// The row is locked for the duration of the transaction, so of two
/// concurrent claims exactly one sees the flag go false -> true.
pub async fn claim_check_in(
    pool: &Pool<Postgres>,
    event_id: i64,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<CheckInClaim> {
    tracing::debug!("Claiming check-in: event_id={}, user_id={}", event_id, user_id);

    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, (i64, bool)>(
        r#"
        SELECT id, checked_in
        FROM event_registrations
        WHERE event_id = $1 AND user_id = $2
        FOR UPDATE
        "#,
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let claim = match row {
        None => CheckInClaim::NotRegistered,
        Some((_, true)) => CheckInClaim::AlreadyCheckedIn,
        Some((id, false)) => {
            sqlx::query(
                "UPDATE event_registrations SET checked_in = TRUE, check_in_time = $2 WHERE id = $1",
            )
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            CheckInClaim::Claimed
        }
    };

    tx.commit().await?;
    Ok(claim)
}

pub async fn attendance_for_event(
    pool: &Pool<Postgres>,
    event_id: i64,
) -> Result<Vec<DbAttendanceRow>> {
    tracing::debug!("Getting attendance for event: {}", event_id);

    let rows = sqlx::query_as::<_, DbAttendanceRow>(
        r#"
        SELECT r.user_id, u.username, r.checked_in, r.check_in_time
        FROM event_registrations r
        JOIN users u ON u.id = r.user_id
        WHERE r.event_id = $1
        ORDER BY u.username
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn events_registered_by(pool: &Pool<Postgres>, user_id: i64) -> Result<Vec<DbEvent>> {
    tracing::debug!("Getting events registered by user: {}", user_id);

    let events = sqlx::query_as::<_, DbEvent>(
        r#"
        SELECT e.id, e.title, e.description, e.start_time, e.end_time, e.online,
               e.location, e.meeting_link, e.max_participants, e.status, e.created_at
        FROM events e
        JOIN event_registrations r ON r.event_id = e.id
        WHERE r.user_id = $1
        ORDER BY e.start_time
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

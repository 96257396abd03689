use eyre::Result;
use sqlx::{Pool, Postgres};

use crate::models::DbUser;

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<DbUser>> {
    tracing::debug!("Getting user by id: {}", id);

    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, username, role, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_users_by_ids_with_role(
    pool: &Pool<Postgres>,
    ids: &[i64],
    role: &str,
) -> Result<Vec<DbUser>> {
    tracing::debug!("Getting {} users by id with role={}", ids.len(), role);

    let users = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, username, role, created_at
        FROM users
        WHERE id = ANY($1) AND role = $2
        ORDER BY id
        "#,
    )
    .bind(ids)
    .bind(role)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Keyset page: users with `role` and id strictly greater than `after_id`.
pub async fn page_users_by_role(
    pool: &Pool<Postgres>,
    role: &str,
    after_id: i64,
    limit: i64,
) -> Result<Vec<DbUser>> {
    tracing::debug!("Paging users: role={}, after_id={}, limit={}", role, after_id, limit);

    let users = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, username, role, created_at
        FROM users
        WHERE role = $1 AND id > $2
        ORDER BY id
        LIMIT $3
        "#,
    )
    .bind(role)
    .bind(after_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn page_followers(
    pool: &Pool<Postgres>,
    instructor_id: i64,
    after_id: i64,
    limit: i64,
) -> Result<Vec<DbUser>> {
    tracing::debug!(
        "Paging followers: instructor_id={}, after_id={}, limit={}",
        instructor_id, after_id, limit
    );

    let users = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT u.id, u.username, u.role, u.created_at
        FROM users u
        JOIN follows f ON f.follower_id = u.id
        WHERE f.instructor_id = $1 AND u.id > $2
        ORDER BY u.id
        LIMIT $3
        "#,
    )
    .bind(instructor_id)
    .bind(after_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn is_follower(
    pool: &Pool<Postgres>,
    follower_id: i64,
    instructor_id: i64,
) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM follows
            WHERE follower_id = $1 AND instructor_id = $2
        );
        "#,
    )
    .bind(follower_id)
    .bind(instructor_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

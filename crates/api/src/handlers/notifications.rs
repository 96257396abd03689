use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use learnhub_core::{errors::LearnError, models::notification::Notification};

use crate::{
    ApiState,
    middleware::{error_handling::AppError, identity::CallerId},
};

async fn load_owned(state: &ApiState, id: i64, owner: i64) -> Result<Notification, AppError> {
    let notification =
        learnhub_db::repositories::notification::get_notification_by_id(&state.db_pool, id)
            .await
            .map_err(LearnError::Database)?
            .ok_or_else(|| LearnError::NotFound(format!("Notification with ID {} not found", id)))?
            .into_model()
            .map_err(LearnError::Database)?;
    if notification.user_id != owner {
        return Err(AppError(LearnError::Forbidden(
            "Notification belongs to another user".to_string(),
        )));
    }
    Ok(notification)
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications =
        learnhub_db::repositories::notification::list_for_user(&state.db_pool, caller.0, Utc::now())
            .await
            .map_err(LearnError::Database)?
            .into_iter()
            .map(|n| n.into_model())
            .collect::<eyre::Result<_>>()
            .map_err(LearnError::Database)?;
    Ok(Json(notifications))
}

#[axum::debug_handler]
pub async fn unread_notifications(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = learnhub_db::repositories::notification::list_unread_for_user(
        &state.db_pool,
        caller.0,
        Utc::now(),
    )
    .await
    .map_err(LearnError::Database)?
    .into_iter()
    .map(|n| n.into_model())
    .collect::<eyre::Result<_>>()
    .map_err(LearnError::Database)?;
    Ok(Json(notifications))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let notification = load_owned(&state, id, caller.0).await?;
    if notification.is_expired(Utc::now()) {
        return Err(AppError(LearnError::Conflict(
            "Notification has expired".to_string(),
        )));
    }

    learnhub_db::repositories::notification::mark_read(&state.db_pool, id)
        .await
        .map_err(LearnError::Database)?;

    Ok(Json(serde_json::json!({ "read": true })))
}

#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    load_owned(&state, id, caller.0).await?;

    learnhub_db::repositories::notification::delete_notification(&state.db_pool, id)
        .await
        .map_err(LearnError::Database)?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

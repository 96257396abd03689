use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use learnhub_core::{
    errors::LearnError,
    models::{
        session::{JoinSessionResponse, Session, SessionRequest},
        user::UserRole,
    },
    status::SessionStatus,
};
use serde::Deserialize;

use crate::{
    ApiState,
    handlers::{load_caller, require_role},
    middleware::{error_handling::AppError, identity::CallerId},
};

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub status: Option<String>,
}

fn validate_dates(request: &SessionRequest) -> Result<(), AppError> {
    if request.end_time <= request.start_time {
        return Err(AppError(LearnError::Validation(
            "Session end time must be after start time".to_string(),
        )));
    }
    Ok(())
}

fn with_lazy_status(mut session: Session) -> Session {
    session.status = session.status_at(Utc::now());
    session
}

async fn load_session(state: &ApiState, id: i64) -> Result<Session, AppError> {
    let session = learnhub_db::repositories::session::get_session_by_id(&state.db_pool, id)
        .await
        .map_err(LearnError::Database)?
        .ok_or_else(|| LearnError::NotFound(format!("Session with ID {} not found", id)))?
        .into_model()
        .map_err(LearnError::Database)?;
    Ok(session)
}

async fn check_overlap(
    state: &ApiState,
    instructor_id: i64,
    request: &SessionRequest,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let overlaps = learnhub_db::repositories::session::has_overlapping_session(
        &state.db_pool,
        instructor_id,
        request.start_time,
        request.end_time,
        exclude_id,
    )
    .await
    .map_err(LearnError::Database)?;
    if overlaps {
        return Err(AppError(LearnError::Conflict(
            "You already have a session scheduled in this time range".to_string(),
        )));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn create_session(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<Session>, AppError> {
    let user = load_caller(&state, caller.0).await?;
    require_role(&user, UserRole::Instructor)?;
    validate_dates(&payload)?;
    check_overlap(&state, user.id, &payload, None).await?;

    let meeting_link = state
        .rooms
        .create_room(&payload.title)
        .await
        .map_err(LearnError::Database)?;

    let session = learnhub_db::repositories::session::create_session(
        &state.db_pool,
        user.id,
        &payload,
        &meeting_link,
    )
    .await
    .map_err(LearnError::Database)?
    .into_model()
    .map_err(LearnError::Database)?;

    Ok(Json(session))
}

#[axum::debug_handler]
pub async fn update_session(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<Session>, AppError> {
    let session = load_session(&state, id).await?;
    if session.instructor_id != caller.0 {
        return Err(AppError(LearnError::Forbidden(
            "Only the owning instructor may modify this session".to_string(),
        )));
    }
    validate_dates(&payload)?;
    check_overlap(&state, session.instructor_id, &payload, Some(id)).await?;

    let updated = learnhub_db::repositories::session::update_session(&state.db_pool, id, &payload)
        .await
        .map_err(LearnError::Database)?
        .into_model()
        .map_err(LearnError::Database)?;

    Ok(Json(updated))
}

#[axum::debug_handler]
pub async fn delete_session(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = load_session(&state, id).await?;
    if session.instructor_id != caller.0 {
        return Err(AppError(LearnError::Forbidden(
            "Only the owning instructor may delete this session".to_string(),
        )));
    }

    learnhub_db::repositories::session::delete_session(&state.db_pool, id)
        .await
        .map_err(LearnError::Database)?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn list_sessions(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Vec<Session>>, AppError> {
    let status_filter = match &query.status {
        Some(raw) => Some(SessionStatus::parse(raw).ok_or_else(|| {
            AppError(LearnError::Validation(format!(
                "Unknown session status: {}",
                raw
            )))
        })?),
        None => None,
    };

    // Visibility is decided in the query: public sessions plus
    // follower-only ones from instructors the caller follows.
    let sessions =
        learnhub_db::repositories::session::list_sessions_visible_to(&state.db_pool, caller.0)
            .await
            .map_err(LearnError::Database)?
            .into_iter()
            .map(|s| s.into_model().map(with_lazy_status))
            .collect::<eyre::Result<Vec<Session>>>()
            .map_err(LearnError::Database)?;
    let sessions = match status_filter {
        Some(status) => sessions
            .into_iter()
            .filter(|s| s.status == status)
            .collect(),
        None => sessions,
    };

    Ok(Json(sessions))
}

#[axum::debug_handler]
pub async fn join_session(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<JoinSessionResponse>, AppError> {
    let session = load_session(&state, id).await?;

    if session.follower_only && session.instructor_id != caller.0 {
        let follows = learnhub_db::repositories::user::is_follower(
            &state.db_pool,
            caller.0,
            session.instructor_id,
        )
        .await
        .map_err(LearnError::Database)?;
        if !follows {
            return Err(AppError(LearnError::Forbidden(
                "This session is limited to the instructor's followers".to_string(),
            )));
        }
    }

    Ok(Json(JoinSessionResponse {
        meeting_link: session.meeting_link,
    }))
}

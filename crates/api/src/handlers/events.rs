use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Duration, Utc};
use learnhub_core::{
    checkin::{CheckInCode, CheckInOutcome},
    errors::LearnError,
    models::{
        event::{
            AttendanceRecord, CheckInRequest, CheckInResponse, Event, EventPage, EventRequest,
            JoinEventResponse, RegisterForEventResponse,
        },
        notification::{Audience, NotificationKind},
        user::UserRole,
    },
    status::EventStatus,
};
use learnhub_engine::{checkin::EARLY_ENTRY_MINUTES, codec};
use serde::Deserialize;

use crate::{
    ApiState,
    handlers::{load_caller, require_role},
    middleware::{error_handling::AppError, identity::CallerId},
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
}

fn validate_dates(request: &EventRequest) -> Result<(), AppError> {
    if request.end_time <= request.start_time {
        return Err(AppError(LearnError::Validation(
            "Event end time must be after start time".to_string(),
        )));
    }
    Ok(())
}

/// Recomputes the display status so readers never see a stale cache entry.
fn with_lazy_status(mut event: Event) -> Event {
    event.status = event.status_at(Utc::now());
    event
}

async fn load_event(state: &ApiState, id: i64) -> Result<Event, AppError> {
    let event = learnhub_db::repositories::event::get_event_by_id(&state.db_pool, id)
        .await
        .map_err(LearnError::Database)?
        .ok_or_else(|| LearnError::NotFound(format!("Event with ID {} not found", id)))?
        .into_model()
        .map_err(LearnError::Database)?;
    Ok(event)
}

#[axum::debug_handler]
pub async fn create_event(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Json(payload): Json<EventRequest>,
) -> Result<Json<Event>, AppError> {
    let user = load_caller(&state, caller.0).await?;
    require_role(&user, UserRole::Admin)?;
    validate_dates(&payload)?;

    // Online events get a meeting room minted up front; a provisioning
    // failure aborts the create.
    let meeting_link = if payload.online {
        Some(
            state
                .rooms
                .create_room(&payload.title)
                .await
                .map_err(LearnError::Database)?,
        )
    } else {
        None
    };

    let event = learnhub_db::repositories::event::create_event(
        &state.db_pool,
        &payload,
        meeting_link.as_deref(),
    )
    .await
    .map_err(LearnError::Database)?
    .into_model()
    .map_err(LearnError::Database)?;

    let message = format!(
        "A new event '{}' starts at {}. [Event ID: {}]",
        event.title, event.start_time, event.id
    );
    state
        .fanout
        .fan_out(
            &Audience::all_users(),
            &format!("New Event: {}", event.title),
            &message,
            NotificationKind::Event,
            Utc::now(),
        )
        .await
        .map_err(LearnError::Database)?;

    Ok(Json(event))
}

#[axum::debug_handler]
pub async fn update_event(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
    Json(payload): Json<EventRequest>,
) -> Result<Json<Event>, AppError> {
    let user = load_caller(&state, caller.0).await?;
    require_role(&user, UserRole::Admin)?;
    validate_dates(&payload)?;

    let existing = load_event(&state, id).await?;

    // Keep the room an online event already has; mint one if the update
    // turns an in-person event online.
    let meeting_link = if payload.online {
        match existing.meeting_link {
            Some(link) => Some(link),
            None => Some(
                state
                    .rooms
                    .create_room(&payload.title)
                    .await
                    .map_err(LearnError::Database)?,
            ),
        }
    } else {
        None
    };

    let event = learnhub_db::repositories::event::update_event(
        &state.db_pool,
        id,
        &payload,
        meeting_link.as_deref(),
    )
    .await
    .map_err(LearnError::Database)?
    .into_model()
    .map_err(LearnError::Database)?;

    let registrants = learnhub_db::repositories::registration::registrant_ids(&state.db_pool, id)
        .await
        .map_err(LearnError::Database)?;
    state
        .fanout
        .fan_out(
            &Audience::Users(registrants),
            &format!("Event Updated: {}", event.title),
            &format!(
                "The event '{}' was updated. It now starts at {}. [Event ID: {}]",
                event.title, event.start_time, event.id
            ),
            NotificationKind::Event,
            Utc::now(),
        )
        .await
        .map_err(LearnError::Database)?;

    Ok(Json(event))
}

#[axum::debug_handler]
pub async fn delete_event(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = load_caller(&state, caller.0).await?;
    require_role(&user, UserRole::Admin)?;

    let event = load_event(&state, id).await?;
    if event.status_at(Utc::now()) == EventStatus::Ongoing {
        return Err(AppError(LearnError::Conflict(
            "Cannot delete an event while it is ongoing".to_string(),
        )));
    }

    // Capture the audience before the rows go away.
    let registrants = learnhub_db::repositories::registration::registrant_ids(&state.db_pool, id)
        .await
        .map_err(LearnError::Database)?;

    learnhub_db::repositories::event::delete_event(&state.db_pool, id)
        .await
        .map_err(LearnError::Database)?;

    state
        .fanout
        .fan_out(
            &Audience::Users(registrants),
            &format!("Event Cancelled: {}", event.title),
            &format!(
                "The event '{}' scheduled for {} has been cancelled.",
                event.title, event.start_time
            ),
            NotificationKind::Event,
            Utc::now(),
        )
        .await
        .map_err(LearnError::Database)?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn get_event(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, AppError> {
    let event = load_event(&state, id).await?;
    Ok(Json(with_lazy_status(event)))
}

#[axum::debug_handler]
pub async fn list_events(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<EventPage>, AppError> {
    let page = query.page.unwrap_or(0).max(0);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let status_filter = match &query.status {
        Some(raw) => Some(EventStatus::parse(raw).ok_or_else(|| {
            AppError(LearnError::Validation(format!(
                "Unknown event status: {}",
                raw
            )))
        })?),
        None => None,
    };

    let events = learnhub_db::repositories::event::list_events(&state.db_pool, page, page_size)
        .await
        .map_err(LearnError::Database)?;

    // The filter compares against the recomputed status, not the persisted
    // cache, so an event that just crossed a boundary filters correctly
    // even before the next reconciliation tick.
    let events: Vec<Event> = events
        .into_iter()
        .map(|e| e.into_model().map(with_lazy_status))
        .collect::<eyre::Result<_>>()
        .map_err(LearnError::Database)?;
    let events = match status_filter {
        Some(status) => events.into_iter().filter(|e| e.status == status).collect(),
        None => events,
    };

    Ok(Json(EventPage {
        events,
        page,
        page_size,
    }))
}

#[axum::debug_handler]
pub async fn register_for_event(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<RegisterForEventResponse>, AppError> {
    let user = load_caller(&state, caller.0).await?;
    let event = load_event(&state, id).await?;

    if event.status_at(Utc::now()) != EventStatus::Upcoming {
        return Err(AppError(LearnError::Conflict(
            "Registration is closed for this event".to_string(),
        )));
    }

    let existing =
        learnhub_db::repositories::registration::get_registration(&state.db_pool, id, user.id)
            .await
            .map_err(LearnError::Database)?;
    if existing.is_some() {
        return Err(AppError(LearnError::Conflict(
            "Already registered for this event".to_string(),
        )));
    }

    if let Some(max) = event.max_participants {
        let count = learnhub_db::repositories::registration::registration_count(&state.db_pool, id)
            .await
            .map_err(LearnError::Database)?;
        if count >= max as i64 {
            return Err(AppError(LearnError::Conflict(
                "Event has reached its participant limit".to_string(),
            )));
        }
    }

    learnhub_db::repositories::registration::create_registration(&state.db_pool, id, user.id)
        .await
        .map_err(LearnError::Database)?;

    // In-person attendees get their door code at registration time; online
    // events have nothing to scan.
    let check_in_code = (!event.online).then(|| {
        codec::encode(&CheckInCode {
            event_id: event.id,
            user_id: user.id,
        })
    });

    Ok(Json(RegisterForEventResponse { check_in_code }))
}

#[axum::debug_handler]
pub async fn cancel_registration(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted =
        learnhub_db::repositories::registration::delete_registration(&state.db_pool, id, caller.0)
            .await
            .map_err(LearnError::Database)?;
    if deleted == 0 {
        return Err(AppError(LearnError::NotFound(format!(
            "No registration for event {} found",
            id
        ))));
    }
    Ok(Json(serde_json::json!({ "cancelled": true })))
}

#[axum::debug_handler]
pub async fn join_event(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<JoinEventResponse>, AppError> {
    let user = load_caller(&state, caller.0).await?;
    let event = load_event(&state, id).await?;

    if !event.online {
        return Err(AppError(LearnError::Validation(
            "This event is not held online".to_string(),
        )));
    }

    // Admins may join any event; everyone else must hold a registration.
    if user.role != UserRole::Admin {
        let registration =
            learnhub_db::repositories::registration::get_registration(&state.db_pool, id, user.id)
                .await
                .map_err(LearnError::Database)?;
        if registration.is_none() {
            return Err(AppError(LearnError::Forbidden(
                "Not registered for this event".to_string(),
            )));
        }
    }

    // Same early-entry window the door scanner honors.
    let now = Utc::now();
    let opens = event.start_time - Duration::minutes(EARLY_ENTRY_MINUTES);
    if now < opens {
        return Err(AppError(LearnError::Conflict(
            "The event has not started yet".to_string(),
        )));
    }
    if now > event.end_time {
        return Err(AppError(LearnError::Conflict(
            "The event has already ended".to_string(),
        )));
    }

    let meeting_link = event.meeting_link.ok_or_else(|| {
        LearnError::Database(eyre::eyre!("online event {} has no meeting link", event.id))
    })?;
    Ok(Json(JoinEventResponse { meeting_link }))
}

#[axum::debug_handler]
pub async fn check_in(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
    Json(payload): Json<CheckInRequest>,
) -> Result<Json<CheckInResponse>, AppError> {
    let outcome = state
        .guard
        .check_in(id, &payload.code, Utc::now())
        .await
        .map_err(LearnError::Database)?;

    // Rejections are part of the scan protocol, not HTTP errors: the
    // scanner displays the reason either way.
    let response = match outcome {
        CheckInOutcome::Accepted { checked_in_at } => CheckInResponse {
            accepted: true,
            reason: None,
            checked_in_at: Some(checked_in_at),
        },
        CheckInOutcome::Rejected(reason) => CheckInResponse {
            accepted: false,
            reason: Some(reason),
            checked_in_at: None,
        },
    };
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn my_events(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
) -> Result<Json<Vec<Event>>, AppError> {
    let events =
        learnhub_db::repositories::registration::events_registered_by(&state.db_pool, caller.0)
            .await
            .map_err(LearnError::Database)?
            .into_iter()
            .map(|e| e.into_model().map(with_lazy_status))
            .collect::<eyre::Result<_>>()
            .map_err(LearnError::Database)?;
    Ok(Json(events))
}

#[axum::debug_handler]
pub async fn event_attendance(
    State(state): State<Arc<ApiState>>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let user = load_caller(&state, caller.0).await?;
    require_role(&user, UserRole::Admin)?;

    let event = load_event(&state, id).await?;
    if event.online {
        return Err(AppError(LearnError::Validation(
            "Attendance tracking applies to in-person events only".to_string(),
        )));
    }

    let records =
        learnhub_db::repositories::registration::attendance_for_event(&state.db_pool, id)
            .await
            .map_err(LearnError::Database)?
            .into_iter()
            .map(|row| row.into_model())
            .collect();
    Ok(Json(records))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::EventStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub online: bool,
    /// Physical venue for in-person events.
    pub location: Option<String>,
    /// Provisioned room URL for online events.
    pub meeting_link: Option<String>,
    pub max_participants: Option<i32>,
    /// Persisted cache of [`EventStatus::at`]; stale by at most one
    /// reconciliation tick.
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Status recomputed against `now`, ignoring the persisted cache.
    pub fn status_at(&self, now: DateTime<Utc>) -> EventStatus {
        EventStatus::at(self.start_time, self.end_time, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReminder {
    pub id: i64,
    pub event_id: i64,
    pub hours_before: i32,
    pub sent_at: DateTime<Utc>,
}

/// Payload for creating or replacing an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub online: bool,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForEventResponse {
    /// Present for in-person events: the opaque code to present at the door.
    pub check_in_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinEventResponse {
    pub meeting_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub user_id: i64,
    pub username: String,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<crate::checkin::CheckInRejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub page: i64,
    pub page_size: i64,
}

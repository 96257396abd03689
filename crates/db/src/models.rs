use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use learnhub_core::models::event::{AttendanceRecord, Event, EventRegistration, EventReminder};
use learnhub_core::models::notification::{Notification, NotificationKind};
use learnhub_core::models::session::Session;
use learnhub_core::models::user::{User, UserRole};
use learnhub_core::status::{EventStatus, SessionStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl DbUser {
    pub fn into_model(self) -> Result<User> {
        let role = UserRole::parse(&self.role)
            .ok_or_else(|| eyre!("unknown user role in database: {}", self.role))?;
        Ok(User {
            id: self.id,
            username: self.username,
            role,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbEvent {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub online: bool,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub max_participants: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl DbEvent {
    pub fn into_model(self) -> Result<Event> {
        let status = EventStatus::parse(&self.status)
            .ok_or_else(|| eyre!("unknown event status in database: {}", self.status))?;
        Ok(Event {
            id: self.id,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            online: self.online,
            location: self.location,
            meeting_link: self.meeting_link,
            max_participants: self.max_participants,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbEventRegistration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DbEventRegistration {
    pub fn into_model(self) -> EventRegistration {
        EventRegistration {
            id: self.id,
            event_id: self.event_id,
            user_id: self.user_id,
            checked_in: self.checked_in,
            check_in_time: self.check_in_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbEventReminder {
    pub id: i64,
    pub event_id: i64,
    pub hours_before: i32,
    pub sent_at: DateTime<Utc>,
}

impl DbEventReminder {
    pub fn into_model(self) -> EventReminder {
        EventReminder {
            id: self.id,
            event_id: self.event_id,
            hours_before: self.hours_before,
            sent_at: self.sent_at,
        }
    }
}

/// Join row backing an attendance export.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAttendanceRow {
    pub user_id: i64,
    pub username: String,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
}

impl DbAttendanceRow {
    pub fn into_model(self) -> AttendanceRecord {
        AttendanceRecord {
            user_id: self.user_id,
            username: self.username,
            checked_in: self.checked_in,
            check_in_time: self.check_in_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSession {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub follower_only: bool,
    pub instructor_id: i64,
    pub meeting_link: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl DbSession {
    pub fn into_model(self) -> Result<Session> {
        let status = SessionStatus::parse(&self.status)
            .ok_or_else(|| eyre!("unknown session status in database: {}", self.status))?;
        Ok(Session {
            id: self.id,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            follower_only: self.follower_only,
            instructor_id: self.instructor_id,
            meeting_link: self.meeting_link,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbNotification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_read: bool,
}

impl DbNotification {
    pub fn into_model(self) -> Result<Notification> {
        let kind = NotificationKind::parse(&self.kind)
            .ok_or_else(|| eyre!("unknown notification kind in database: {}", self.kind))?;
        Ok(Notification {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            message: self.message,
            kind,
            created_at: self.created_at,
            expires_at: self.expires_at,
            is_read: self.is_read,
        })
    }
}

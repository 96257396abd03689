use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::SessionStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// When set, only followers of the instructor may see or join.
    pub follower_only: bool,
    pub instructor_id: i64,
    pub meeting_link: String,
    /// Persisted cache of [`SessionStatus::at`]; stale by at most one
    /// reconciliation tick.
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn status_at(&self, now: DateTime<Utc>) -> SessionStatus {
        SessionStatus::at(self.start_time, self.end_time, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub follower_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSessionResponse {
    pub meeting_link: String,
}

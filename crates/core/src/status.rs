//! Lifecycle status derivation for time-bounded entities.
//!
//! The persisted `status` columns on events and sessions are caches of these
//! functions; the reconciler refreshes them on a fixed period, and read paths
//! that need an exact answer recompute with the current clock. Both functions
//! are monotonic for a fixed window: once a window has ended, no later clock
//! value yields a non-ended status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a scheduled event relative to its time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Ended,
}

impl EventStatus {
    /// Derives the status at `now`. The end boundary is inclusive: an event
    /// is still ongoing at the exact end instant.
    pub fn at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start {
            EventStatus::Upcoming
        } else if now > end {
            EventStatus::Ended
        } else {
            EventStatus::Ongoing
        }
    }

    pub fn is_terminal(self) -> bool {
        self == EventStatus::Ended
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "UPCOMING",
            EventStatus::Ongoing => "ONGOING",
            EventStatus::Ended => "ENDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UPCOMING" => Some(EventStatus::Upcoming),
            "ONGOING" => Some(EventStatus::Ongoing),
            "ENDED" => Some(EventStatus::Ended),
            _ => None,
        }
    }
}

/// Status of a live teaching session relative to its time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Upcoming,
    Live,
    Ended,
}

impl SessionStatus {
    /// Derives the status at `now`. The end boundary is exclusive: a session
    /// has ended at the exact end instant.
    pub fn at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start {
            SessionStatus::Upcoming
        } else if now >= end {
            SessionStatus::Ended
        } else {
            SessionStatus::Live
        }
    }

    pub fn is_terminal(self) -> bool {
        self == SessionStatus::Ended
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Upcoming => "UPCOMING",
            SessionStatus::Live => "LIVE",
            SessionStatus::Ended => "ENDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UPCOMING" => Some(SessionStatus::Upcoming),
            "LIVE" => Some(SessionStatus::Live),
            "ENDED" => Some(SessionStatus::Ended),
            _ => None,
        }
    }
}

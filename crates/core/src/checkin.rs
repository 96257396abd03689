//! Check-in vocabulary: the payload carried inside a scanned code and the
//! reason-coded outcome of validating a scan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload encoded into the code handed out at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInCode {
    #[serde(rename = "eventId")]
    pub event_id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Why a scan was rejected. Every failure path returns a distinct reason so
/// the scanning client can show something better than "invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInRejection {
    /// The code did not decode to a well-formed payload with positive ids.
    MalformedCode,
    /// The payload names a different event than the endpoint it was scanned at.
    EventMismatch,
    /// The event or the user no longer exists.
    NotFound,
    /// Scanned before the 10-minute pre-start grace or after the event ended.
    OutsideWindow,
    /// No registration exists for this (event, user) pair.
    NotRegistered,
    /// The registration already carries a successful check-in.
    AlreadyCheckedIn,
    /// A successful scan for the same pair happened within the last 30 seconds.
    CooldownActive,
}

impl CheckInRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckInRejection::MalformedCode => "MALFORMED_CODE",
            CheckInRejection::EventMismatch => "EVENT_MISMATCH",
            CheckInRejection::NotFound => "NOT_FOUND",
            CheckInRejection::OutsideWindow => "OUTSIDE_WINDOW",
            CheckInRejection::NotRegistered => "NOT_REGISTERED",
            CheckInRejection::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            CheckInRejection::CooldownActive => "COOLDOWN_ACTIVE",
        }
    }
}

/// Result of processing one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    Accepted { checked_in_at: DateTime<Utc> },
    Rejected(CheckInRejection),
}

impl CheckInOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CheckInOutcome::Accepted { .. })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Session,
    Course,
    System,
    Followers,
    Review,
    Category,
    Event,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Session => "SESSION",
            NotificationKind::Course => "COURSE",
            NotificationKind::System => "SYSTEM",
            NotificationKind::Followers => "FOLLOWERS",
            NotificationKind::Review => "REVIEW",
            NotificationKind::Category => "CATEGORY",
            NotificationKind::Event => "EVENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SESSION" => Some(NotificationKind::Session),
            "COURSE" => Some(NotificationKind::Course),
            "SYSTEM" => Some(NotificationKind::System),
            "FOLLOWERS" => Some(NotificationKind::Followers),
            "REVIEW" => Some(NotificationKind::Review),
            "CATEGORY" => Some(NotificationKind::Category),
            "EVENT" => Some(NotificationKind::Event),
            _ => None,
        }
    }
}

/// A delivered notification. Immutable once created apart from `is_read`
/// and eventual expiry deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_read: bool,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Row content for a notification about to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Who a fan-out should reach. The two shapes are deliberately distinct:
/// an empty `Users` list reaches nobody, it is never a stand-in for
/// "every user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// An explicit recipient list, filtered to the USER role at send time.
    Users(Vec<i64>),
    /// Every user with `role`, optionally restricted to followers of an
    /// instructor.
    Role {
        role: UserRole,
        follower_of: Option<i64>,
    },
}

impl Audience {
    pub fn all_users() -> Self {
        Audience::Role {
            role: UserRole::User,
            follower_of: None,
        }
    }

    pub fn followers_of(instructor_id: i64) -> Self {
        Audience::Role {
            role: UserRole::User,
            follower_of: Some(instructor_id),
        }
    }
}

//! Contracts the engine consumes from its collaborators.
//!
//! Everything behind these traits is "someone else's problem": the user
//! directory, the event/session/registration store, the reminder ledger and
//! the notification store. Postgres implementations live in `learnhub-db`;
//! the engine itself only relies on the semantics documented here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use learnhub_core::{
    models::{
        event::{Event, EventRegistration},
        notification::{NewNotification, Notification},
        session::Session,
        user::{User, UserRole},
    },
    status::{EventStatus, SessionStatus},
};

/// Outcome of an atomic check-in claim on a registration row.
///
/// The implementation must serialize concurrent claims on the same row
/// (row lock or equivalent) so that exactly one caller observes `Claimed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInClaim {
    /// This caller won: the flag went false -> true in this call.
    Claimed,
    /// The registration was already checked in.
    AlreadyCheckedIn,
    /// No registration exists for the pair.
    NotRegistered,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Fetches the subset of `ids` that exist and carry `role`.
    async fn find_by_ids_with_role(&self, ids: &[i64], role: UserRole) -> Result<Vec<User>>;

    /// Keyset page of users with `role`, ids strictly greater than
    /// `after_id`, ascending, at most `limit` rows.
    async fn page_by_role(&self, role: UserRole, after_id: i64, limit: i64) -> Result<Vec<User>>;

    /// Same as [`Self::page_by_role`] restricted to followers of the
    /// instructor.
    async fn page_followers(
        &self,
        instructor_id: i64,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<User>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Event>>;

    /// Every event whose persisted status is not terminal. Ended events are
    /// excluded from reconciliation scans for good: the status function is
    /// monotonic, so they can never transition again.
    async fn active_events(&self) -> Result<Vec<Event>>;

    async fn set_status(&self, id: i64, status: EventStatus) -> Result<()>;

    /// Events with `start_time` in `[lo, hi]`.
    async fn starting_between(&self, lo: DateTime<Utc>, hi: DateTime<Utc>) -> Result<Vec<Event>>;

    async fn registrant_ids(&self, event_id: i64) -> Result<Vec<i64>>;

    async fn find_registration(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<EventRegistration>>;

    /// Atomically flips `checked_in` for the pair; see [`CheckInClaim`].
    async fn claim_check_in(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CheckInClaim>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Every session whose persisted status is not terminal.
    async fn active_sessions(&self) -> Result<Vec<Session>>;

    async fn set_status(&self, id: i64, status: SessionStatus) -> Result<()>;
}

#[async_trait]
pub trait ReminderLedger: Send + Sync {
    /// Whether a reminder for (event, lead time) was already recorded.
    async fn exists(&self, event_id: i64, hours_before: i32) -> Result<bool>;

    /// Records the ledger row. Must be idempotent under the unique
    /// (event_id, hours_before) key.
    async fn record(&self, event_id: i64, hours_before: i32, sent_at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persists the whole batch in one write and returns the stored rows.
    async fn insert_batch(&self, rows: &[NewNotification]) -> Result<Vec<Notification>>;

    /// Ids of at most `limit` notifications with `expires_at < now`.
    async fn expired_ids(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<i64>>;

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64>;
}

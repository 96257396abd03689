//! Postgres-backed implementations of the engine ports.
//!
//! A single cloneable handle wraps the pool; each port delegates to the
//! repository functions and converts rows into core models.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use learnhub_core::models::event::{Event, EventRegistration};
use learnhub_core::models::notification::{NewNotification, Notification};
use learnhub_core::models::session::Session;
use learnhub_core::models::user::{User, UserRole};
use learnhub_core::status::{EventStatus, SessionStatus};
use learnhub_engine::ports::{
    CheckInClaim, EventStore, NotificationStore, ReminderLedger, SessionStore, UserDirectory,
};

use crate::DbPool;
use crate::repositories::{event, notification, registration, reminder, session, user};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        user::get_user_by_id(&self.pool, id)
            .await?
            .map(|u| u.into_model())
            .transpose()
    }

    async fn find_by_ids_with_role(&self, ids: &[i64], role: UserRole) -> Result<Vec<User>> {
        user::get_users_by_ids_with_role(&self.pool, ids, role.as_str())
            .await?
            .into_iter()
            .map(|u| u.into_model())
            .collect()
    }

    async fn page_by_role(&self, role: UserRole, after_id: i64, limit: i64) -> Result<Vec<User>> {
        user::page_users_by_role(&self.pool, role.as_str(), after_id, limit)
            .await?
            .into_iter()
            .map(|u| u.into_model())
            .collect()
    }

    async fn page_followers(
        &self,
        instructor_id: i64,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<User>> {
        user::page_followers(&self.pool, instructor_id, after_id, limit)
            .await?
            .into_iter()
            .map(|u| u.into_model())
            .collect()
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        event::get_event_by_id(&self.pool, id)
            .await?
            .map(|e| e.into_model())
            .transpose()
    }

    async fn active_events(&self) -> Result<Vec<Event>> {
        event::list_active_events(&self.pool)
            .await?
            .into_iter()
            .map(|e| e.into_model())
            .collect()
    }

    async fn set_status(&self, id: i64, status: EventStatus) -> Result<()> {
        event::set_event_status(&self.pool, id, status.as_str()).await
    }

    async fn starting_between(&self, lo: DateTime<Utc>, hi: DateTime<Utc>) -> Result<Vec<Event>> {
        event::events_starting_between(&self.pool, lo, hi)
            .await?
            .into_iter()
            .map(|e| e.into_model())
            .collect()
    }

    async fn registrant_ids(&self, event_id: i64) -> Result<Vec<i64>> {
        registration::registrant_ids(&self.pool, event_id).await
    }

    async fn find_registration(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<EventRegistration>> {
        Ok(registration::get_registration(&self.pool, event_id, user_id)
            .await?
            .map(|r| r.into_model()))
    }

    async fn claim_check_in(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CheckInClaim> {
        registration::claim_check_in(&self.pool, event_id, user_id, now).await
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn active_sessions(&self) -> Result<Vec<Session>> {
        session::list_active_sessions(&self.pool)
            .await?
            .into_iter()
            .map(|s| s.into_model())
            .collect()
    }

    async fn set_status(&self, id: i64, status: SessionStatus) -> Result<()> {
        session::set_session_status(&self.pool, id, status.as_str()).await
    }
}

#[async_trait]
impl ReminderLedger for PgStore {
    async fn exists(&self, event_id: i64, hours_before: i32) -> Result<bool> {
        reminder::reminder_exists(&self.pool, event_id, hours_before).await
    }

    async fn record(&self, event_id: i64, hours_before: i32, sent_at: DateTime<Utc>) -> Result<()> {
        reminder::record_reminder(&self.pool, event_id, hours_before, sent_at).await
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_batch(&self, rows: &[NewNotification]) -> Result<Vec<Notification>> {
        notification::insert_notifications(&self.pool, rows)
            .await?
            .into_iter()
            .map(|n| n.into_model())
            .collect()
    }

    async fn expired_ids(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<i64>> {
        notification::expired_ids(&self.pool, now, limit).await
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64> {
        notification::delete_by_ids(&self.pool, ids).await
    }
}

//! Mockall doubles for the engine ports, shared by the engine's own tests
//! and by downstream crates that exercise engine components without a
//! database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use mockall::mock;

use learnhub_core::{
    models::{
        event::{Event, EventRegistration},
        notification::{NewNotification, Notification},
        session::Session,
        user::{User, UserRole},
    },
    status::{EventStatus, SessionStatus},
};

use crate::ports::{
    CheckInClaim, EventStore, NotificationStore, ReminderLedger, SessionStore, UserDirectory,
};
use crate::push::PushChannel;
use crate::rooms::RoomProvider;

mock! {
    pub Users {}

    #[async_trait]
    impl UserDirectory for Users {
        async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
        async fn find_by_ids_with_role(&self, ids: &[i64], role: UserRole) -> Result<Vec<User>>;
        async fn page_by_role(&self, role: UserRole, after_id: i64, limit: i64) -> Result<Vec<User>>;
        async fn page_followers(
            &self,
            instructor_id: i64,
            after_id: i64,
            limit: i64,
        ) -> Result<Vec<User>>;
    }
}

mock! {
    pub Events {}

    #[async_trait]
    impl EventStore for Events {
        async fn find_by_id(&self, id: i64) -> Result<Option<Event>>;
        async fn active_events(&self) -> Result<Vec<Event>>;
        async fn set_status(&self, id: i64, status: EventStatus) -> Result<()>;
        async fn starting_between(
            &self,
            lo: DateTime<Utc>,
            hi: DateTime<Utc>,
        ) -> Result<Vec<Event>>;
        async fn registrant_ids(&self, event_id: i64) -> Result<Vec<i64>>;
        async fn find_registration(
            &self,
            event_id: i64,
            user_id: i64,
        ) -> Result<Option<EventRegistration>>;
        async fn claim_check_in(
            &self,
            event_id: i64,
            user_id: i64,
            now: DateTime<Utc>,
        ) -> Result<CheckInClaim>;
    }
}

mock! {
    pub Sessions {}

    #[async_trait]
    impl SessionStore for Sessions {
        async fn active_sessions(&self) -> Result<Vec<Session>>;
        async fn set_status(&self, id: i64, status: SessionStatus) -> Result<()>;
    }
}

mock! {
    pub Reminders {}

    #[async_trait]
    impl ReminderLedger for Reminders {
        async fn exists(&self, event_id: i64, hours_before: i32) -> Result<bool>;
        async fn record(
            &self,
            event_id: i64,
            hours_before: i32,
            sent_at: DateTime<Utc>,
        ) -> Result<()>;
    }
}

mock! {
    pub Notifications {}

    #[async_trait]
    impl NotificationStore for Notifications {
        async fn insert_batch(&self, rows: &[NewNotification]) -> Result<Vec<Notification>>;
        async fn expired_ids(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<i64>>;
        async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64>;
    }
}

mock! {
    pub Push {}

    #[async_trait]
    impl PushChannel for Push {
        async fn publish(&self, user_id: i64, notification: &Notification) -> Result<()>;
    }
}

mock! {
    pub Rooms {}

    #[async_trait]
    impl RoomProvider for Rooms {
        async fn create_room(&self, title: &str) -> Result<String>;
    }
}

//! Lifecycle status reconciliation.
//!
//! The persisted status column is a cache of the pure status function; each
//! pass recomputes it for every non-terminal entity, persists the ones that
//! moved, and notifies the affected audience when an entity goes live or
//! ends. A pass with no elapsed time writes nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::Result;
use learnhub_core::models::{
    event::Event,
    notification::{Audience, NotificationKind},
    session::Session,
};
use learnhub_core::status::{EventStatus, SessionStatus};

use crate::fanout::NotificationFanout;
use crate::ports::{EventStore, SessionStore, UserDirectory};

pub struct LifecycleReconciler {
    events: Arc<dyn EventStore>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    fanout: Arc<NotificationFanout>,
}

impl LifecycleReconciler {
    pub fn new(
        events: Arc<dyn EventStore>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        fanout: Arc<NotificationFanout>,
    ) -> Self {
        Self {
            events,
            sessions,
            users,
            fanout,
        }
    }

    /// Recomputes event statuses. Returns the number of transitions
    /// persisted.
    pub async fn reconcile_events(&self, now: DateTime<Utc>) -> Result<u32> {
        let events = self.events.active_events().await?;
        tracing::debug!(count = events.len(), "reconciling event statuses");

        let mut transitions = 0u32;
        for event in &events {
            let old_status = event.status;
            let new_status = event.status_at(now);
            if new_status == old_status {
                continue;
            }

            self.events.set_status(event.id, new_status).await?;
            transitions += 1;
            tracing::info!(
                event_id = event.id,
                from = old_status.as_str(),
                to = new_status.as_str(),
                "event status transition"
            );

            if matches!(new_status, EventStatus::Ongoing | EventStatus::Ended) {
                self.announce_event(event, new_status, now).await?;
            }
        }
        Ok(transitions)
    }

    async fn announce_event(
        &self,
        event: &Event,
        status: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let registrants = self.events.registrant_ids(event.id).await?;
        if registrants.is_empty() {
            return Ok(());
        }

        let venue = if event.online {
            match &event.meeting_link {
                Some(link) => format!("Join online: {}", link),
                None => "Online event".to_string(),
            }
        } else {
            format!(
                "Location: {}",
                event.location.as_deref().unwrap_or("to be announced")
            )
        };
        let title = format!("Event Status Update: {}", event.title);
        let message = format!(
            "The event '{}' is now {}. {} [Event ID: {}]",
            event.title,
            status.as_str(),
            venue,
            event.id
        );

        self.fanout
            .fan_out(
                &Audience::Users(registrants),
                &title,
                &message,
                NotificationKind::Event,
                now,
            )
            .await?;
        Ok(())
    }

    /// Recomputes session statuses. Returns the number of transitions
    /// persisted.
    pub async fn reconcile_sessions(&self, now: DateTime<Utc>) -> Result<u32> {
        let sessions = self.sessions.active_sessions().await?;
        tracing::debug!(count = sessions.len(), "reconciling session statuses");

        let mut transitions = 0u32;
        for session in &sessions {
            let old_status = session.status;
            let new_status = session.status_at(now);
            if new_status == old_status {
                continue;
            }

            self.sessions.set_status(session.id, new_status).await?;
            transitions += 1;
            tracing::info!(
                session_id = session.id,
                from = old_status.as_str(),
                to = new_status.as_str(),
                "session status transition"
            );

            if matches!(new_status, SessionStatus::Live | SessionStatus::Ended) {
                self.announce_session(session, new_status, now).await?;
            }
        }
        Ok(transitions)
    }

    async fn announce_session(
        &self,
        session: &Session,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        // Follower-only sessions reach the instructor's followers; public
        // ones reach every platform user.
        let audience = if session.follower_only {
            Audience::followers_of(session.instructor_id)
        } else {
            Audience::all_users()
        };

        let instructor = self
            .users
            .find_by_id(session.instructor_id)
            .await?
            .map(|user| user.username)
            .unwrap_or_else(|| format!("instructor #{}", session.instructor_id));

        let (title, message) = match status {
            SessionStatus::Live => (
                format!("Session Live: {}", session.title),
                format!(
                    "The session by {} is now live! Join here: {}",
                    instructor, session.meeting_link
                ),
            ),
            SessionStatus::Ended => (
                format!("Session Ended: {}", session.title),
                format!("The session by {} has ended.", instructor),
            ),
            SessionStatus::Upcoming => return Ok(()),
        };

        self.fanout
            .fan_out(&audience, &title, &message, NotificationKind::Session, now)
            .await?;
        Ok(())
    }
}

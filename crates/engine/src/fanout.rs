//! Notification fan-out.
//!
//! One logical notification, many recipients. The recipient set is never
//! materialized: explicit id lists are chunked, role audiences are walked
//! with keyset pagination, and each batch is persisted in a single write
//! before any push is attempted. A push failure for one recipient is logged
//! and isolated; the persisted row is the record of truth either way.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use eyre::Result;
use learnhub_core::models::{
    notification::{Audience, NewNotification, Notification, NotificationKind},
    user::User,
};

use crate::ports::{NotificationStore, UserDirectory};
use crate::push::PushChannel;

/// Recipients fetched and written per batch.
pub const BATCH_SIZE: usize = 100;
/// Expired rows deleted per cleanup statement.
pub const CLEANUP_BATCH_SIZE: i64 = 1000;

pub struct NotificationFanout {
    users: Arc<dyn UserDirectory>,
    store: Arc<dyn NotificationStore>,
    push: Arc<dyn PushChannel>,
    ttl: Duration,
}

impl NotificationFanout {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        store: Arc<dyn NotificationStore>,
        push: Arc<dyn PushChannel>,
        expiry_days: i64,
    ) -> Self {
        Self {
            users,
            store,
            push,
            ttl: Duration::days(expiry_days),
        }
    }

    /// Persists and pushes one notification for a single recipient.
    pub async fn notify_user(
        &self,
        user_id: i64,
        title: &str,
        message: &str,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> Result<Notification> {
        let row = NewNotification {
            user_id,
            title: title.to_string(),
            message: message.to_string(),
            kind,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let mut stored = self.store.insert_batch(std::slice::from_ref(&row)).await?;
        let notification = stored
            .pop()
            .ok_or_else(|| eyre::eyre!("notification insert returned no row"))?;
        self.push_one(&notification).await;
        Ok(notification)
    }

    /// Delivers `title`/`message` to every member of `audience`. Returns the
    /// number of notifications persisted.
    pub async fn fan_out(
        &self,
        audience: &Audience,
        title: &str,
        message: &str,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let total = match audience {
            Audience::Users(ids) => {
                let mut total = 0u64;
                for chunk in ids.chunks(BATCH_SIZE) {
                    let users = self
                        .users
                        .find_by_ids_with_role(chunk, learnhub_core::models::user::UserRole::User)
                        .await?;
                    total += self.deliver_batch(&users, title, message, kind, now).await?;
                }
                total
            }
            Audience::Role { role, follower_of } => {
                let mut total = 0u64;
                let mut cursor = 0i64;
                loop {
                    let users = match follower_of {
                        Some(instructor_id) => {
                            self.users
                                .page_followers(*instructor_id, cursor, BATCH_SIZE as i64)
                                .await?
                        }
                        None => {
                            self.users
                                .page_by_role(*role, cursor, BATCH_SIZE as i64)
                                .await?
                        }
                    };
                    let Some(last) = users.last() else {
                        break;
                    };
                    cursor = last.id;
                    total += self.deliver_batch(&users, title, message, kind, now).await?;
                }
                total
            }
        };

        tracing::info!(total, title, "fan-out complete");
        Ok(total)
    }

    async fn deliver_batch(
        &self,
        users: &[User],
        title: &str,
        message: &str,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        if users.is_empty() {
            return Ok(0);
        }

        let expires_at = now + self.ttl;
        let rows: Vec<NewNotification> = users
            .iter()
            .map(|user| NewNotification {
                user_id: user.id,
                title: title.to_string(),
                message: message.to_string(),
                kind,
                created_at: now,
                expires_at,
            })
            .collect();

        let stored = self.store.insert_batch(&rows).await?;
        tracing::debug!(count = stored.len(), "persisted notification batch");

        for notification in &stored {
            self.push_one(notification).await;
        }

        Ok(stored.len() as u64)
    }

    async fn push_one(&self, notification: &Notification) {
        if let Err(err) = self
            .push
            .publish(notification.user_id, notification)
            .await
        {
            // Push is best-effort; the persisted row is what counts.
            tracing::warn!(
                user_id = notification.user_id,
                notification_id = notification.id,
                error = %err,
                "push delivery failed"
            );
        }
    }

    /// Deletes expired notifications in bounded batches until none remain.
    /// Returns the number of rows removed.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut total = 0u64;
        loop {
            let ids = self.store.expired_ids(now, CLEANUP_BATCH_SIZE).await?;
            if ids.is_empty() {
                break;
            }
            let deleted = self.store.delete_by_ids(&ids).await?;
            total += deleted;
            tracing::debug!(deleted, total, "deleted expired notification batch");
            // A short page means the store has no more expired rows.
            if (ids.len() as i64) < CLEANUP_BATCH_SIZE {
                break;
            }
        }
        if total > 0 {
            tracing::info!(total, "expired notification cleanup complete");
        }
        Ok(total)
    }
}

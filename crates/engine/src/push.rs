//! Real-time delivery channel.
//!
//! Push is a convenience layer on top of the persisted notification rows: a
//! publish failure is logged and forgotten, and a client that missed a push
//! recovers through the read path.

use async_trait::async_trait;
use eyre::Result;
use learnhub_core::models::notification::Notification;
use serde::Serialize;
use tokio::sync::broadcast;

#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Best-effort delivery of one notification to one recipient.
    async fn publish(&self, user_id: i64, notification: &Notification) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub user_id: i64,
    pub notification: Notification,
}

/// In-process fan-in topic backed by `tokio::sync::broadcast`. Connected
/// clients (e.g. websocket sessions) subscribe and filter by user id.
pub struct BroadcastPush {
    tx: broadcast::Sender<PushMessage>,
}

impl BroadcastPush {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl PushChannel for BroadcastPush {
    async fn publish(&self, user_id: i64, notification: &Notification) -> Result<()> {
        let message = PushMessage {
            user_id,
            notification: notification.clone(),
        };
        // No subscribers is the normal idle state, not a failure.
        if self.tx.send(message).is_err() {
            tracing::trace!(user_id, "no push subscribers connected");
        }
        Ok(())
    }
}

//! Meeting room provisioning.
//!
//! Room creation is an opaque external call: the engine only needs a join
//! URL back. A provisioning failure is fatal to the create or update that
//! asked for it; nothing here retries.

use async_trait::async_trait;
use eyre::Result;
use uuid::Uuid;

#[async_trait]
pub trait RoomProvider: Send + Sync {
    async fn create_room(&self, title: &str) -> Result<String>;
}

/// Generates meet.jit.si room URLs. Jitsi rooms materialize on first join,
/// so "provisioning" is just minting an unguessable identifier.
pub struct JitsiRooms {
    base_url: String,
}

impl JitsiRooms {
    pub fn new() -> Self {
        Self::with_base_url("https://meet.jit.si")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for JitsiRooms {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomProvider for JitsiRooms {
    async fn create_room(&self, title: &str) -> Result<String> {
        let room = format!("{}/{}", self.base_url, Uuid::new_v4());
        tracing::debug!(title, room, "provisioned meeting room");
        Ok(room)
    }
}

//! Attendance check-in validation.
//!
//! A scan arrives as an opaque code plus the event id from the route it was
//! scanned at. [`CheckInGuard::check_in`] walks the validation sequence and
//! returns a reason-coded outcome; only the final claim writes anything. The
//! persisted `checked_in` flag is the source of truth; the in-process
//! [`CheckInCooldowns`] map exists purely to absorb rapid duplicate scans
//! from flaky scanners before the persisted flag becomes visible.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use eyre::Result;
use learnhub_core::checkin::{CheckInOutcome, CheckInRejection};

use crate::codec;
use crate::ports::{CheckInClaim, EventStore, UserDirectory};

/// Minutes before the event window opens during which scans are accepted.
pub const EARLY_ENTRY_MINUTES: i64 = 10;
/// Seconds after a successful scan during which repeats are suppressed.
pub const COOLDOWN_SECONDS: i64 = 30;

/// Time-indexed map of recent successful check-ins, keyed by
/// (event_id, user_id).
///
/// Local to one running instance: in a multi-instance deployment this does
/// not deduplicate across processes and would need a shared expiring cache.
/// The persisted flag still guarantees at most one durable check-in.
pub struct CheckInCooldowns {
    entries: Mutex<HashMap<(i64, i64), DateTime<Utc>>>,
    cooldown: Duration,
}

impl CheckInCooldowns {
    pub fn new() -> Self {
        Self::with_cooldown(Duration::seconds(COOLDOWN_SECONDS))
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            cooldown,
        }
    }

    /// Whether a scan for the pair landed within the cooldown window.
    pub fn active(&self, event_id: i64, user_id: i64, now: DateTime<Utc>) -> bool {
        let entries = self.entries.lock().expect("cooldown lock");
        entries
            .get(&(event_id, user_id))
            .is_some_and(|at| now < *at + self.cooldown)
    }

    pub fn touch(&self, event_id: i64, user_id: i64, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().expect("cooldown lock");
        entries.insert((event_id, user_id), now);
    }

    /// Discards entries older than the cooldown window. Returns how many
    /// were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().expect("cooldown lock");
        let before = entries.len();
        entries.retain(|_, at| now < *at + self.cooldown);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cooldown lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CheckInCooldowns {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CheckInGuard {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserDirectory>,
    cooldowns: Arc<CheckInCooldowns>,
}

impl CheckInGuard {
    pub fn new(
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserDirectory>,
        cooldowns: Arc<CheckInCooldowns>,
    ) -> Self {
        Self {
            events,
            users,
            cooldowns,
        }
    }

    /// Validates one scan. Store failures surface as errors; every domain
    /// failure comes back as a distinct [`CheckInRejection`].
    pub async fn check_in(
        &self,
        route_event_id: i64,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome> {
        let Some(code) = codec::decode(raw_code) else {
            tracing::warn!(event_id = route_event_id, "rejected malformed check-in code");
            return Ok(CheckInOutcome::Rejected(CheckInRejection::MalformedCode));
        };

        if code.event_id != route_event_id {
            tracing::warn!(
                code_event_id = code.event_id,
                route_event_id,
                "check-in code scanned at the wrong event"
            );
            return Ok(CheckInOutcome::Rejected(CheckInRejection::EventMismatch));
        }

        let Some(event) = self.events.find_by_id(code.event_id).await? else {
            return Ok(CheckInOutcome::Rejected(CheckInRejection::NotFound));
        };
        if self.users.find_by_id(code.user_id).await?.is_none() {
            return Ok(CheckInOutcome::Rejected(CheckInRejection::NotFound));
        }

        let window_opens = event.start_time - Duration::minutes(EARLY_ENTRY_MINUTES);
        if now < window_opens || now > event.end_time {
            tracing::warn!(
                event_id = event.id,
                user_id = code.user_id,
                %now,
                "check-in attempted outside the allowed window"
            );
            return Ok(CheckInOutcome::Rejected(CheckInRejection::OutsideWindow));
        }

        // Durable flag first: the registration row decides, the cooldown map
        // only shields it from rapid duplicate scans.
        match self
            .events
            .find_registration(code.event_id, code.user_id)
            .await?
        {
            None => {
                return Ok(CheckInOutcome::Rejected(CheckInRejection::NotRegistered));
            }
            Some(registration) if registration.checked_in => {
                return Ok(CheckInOutcome::Rejected(CheckInRejection::AlreadyCheckedIn));
            }
            Some(_) => {}
        }

        if self.cooldowns.active(code.event_id, code.user_id, now) {
            tracing::warn!(
                event_id = code.event_id,
                user_id = code.user_id,
                "duplicate scan within cooldown"
            );
            return Ok(CheckInOutcome::Rejected(CheckInRejection::CooldownActive));
        }

        // Record the cooldown before the claim lands so a scanner that
        // double-fires sees CooldownActive even while the write is in flight.
        self.cooldowns.touch(code.event_id, code.user_id, now);

        match self
            .events
            .claim_check_in(code.event_id, code.user_id, now)
            .await?
        {
            CheckInClaim::Claimed => {
                tracing::info!(
                    event_id = code.event_id,
                    user_id = code.user_id,
                    "check-in accepted"
                );
                Ok(CheckInOutcome::Accepted { checked_in_at: now })
            }
            CheckInClaim::AlreadyCheckedIn => {
                Ok(CheckInOutcome::Rejected(CheckInRejection::AlreadyCheckedIn))
            }
            CheckInClaim::NotRegistered => {
                Ok(CheckInOutcome::Rejected(CheckInRejection::NotRegistered))
            }
        }
    }
}

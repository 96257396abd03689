//! Pre-event reminder sweeps.
//!
//! For each configured lead time H the sweep looks at events starting inside
//! a ±1 hour band around `now + H` (the tick period is coarser than the lead
//! time is exact) and sends one reminder to the event's registrants, gated by
//! a ledger row per (event, H). The ledger row is written after the fan-out,
//! so a crash in between re-sends on the next tick: at-least-once, never
//! zero.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use eyre::Result;
use learnhub_core::models::{
    event::Event,
    notification::{Audience, NotificationKind},
};

use crate::fanout::NotificationFanout;
use crate::ports::{EventStore, ReminderLedger};

/// Half-width of the candidate window around the exact lead time.
pub const WINDOW_TOLERANCE_HOURS: i64 = 1;

/// The `[lo, hi]` band of start times examined for lead time `hours`.
pub fn reminder_window(now: DateTime<Utc>, hours: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        now + Duration::hours(hours - WINDOW_TOLERANCE_HOURS),
        now + Duration::hours(hours + WINDOW_TOLERANCE_HOURS),
    )
}

pub struct ReminderDeduper {
    events: Arc<dyn EventStore>,
    ledger: Arc<dyn ReminderLedger>,
    fanout: Arc<NotificationFanout>,
    lead_hours: Vec<i64>,
}

impl ReminderDeduper {
    pub fn new(
        events: Arc<dyn EventStore>,
        ledger: Arc<dyn ReminderLedger>,
        fanout: Arc<NotificationFanout>,
        lead_hours: Vec<i64>,
    ) -> Self {
        Self {
            events,
            ledger,
            fanout,
            lead_hours,
        }
    }

    /// Runs one sweep over all configured lead times. Returns how many
    /// reminders were sent.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u32> {
        let mut sent = 0u32;
        for &hours in &self.lead_hours {
            let (lo, hi) = reminder_window(now, hours);
            let candidates = self.events.starting_between(lo, hi).await?;
            tracing::debug!(
                hours,
                count = candidates.len(),
                %lo,
                %hi,
                "reminder sweep candidates"
            );

            for event in &candidates {
                if self.ledger.exists(event.id, hours as i32).await? {
                    tracing::debug!(event_id = event.id, hours, "reminder already sent");
                    continue;
                }
                if self.remind(event, hours, now).await? {
                    sent += 1;
                }
            }
        }
        Ok(sent)
    }

    /// Sends the reminder for one event and records the ledger row. Events
    /// with no registrants send nothing and record nothing; they are simply
    /// re-examined on the next tick.
    async fn remind(&self, event: &Event, hours: i64, now: DateTime<Utc>) -> Result<bool> {
        let registrants = self.events.registrant_ids(event.id).await?;
        if registrants.is_empty() {
            tracing::debug!(event_id = event.id, "no registered users to remind");
            return Ok(false);
        }

        let title = format!("Reminder: {} in {} Hours", event.title, hours);
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
        let message = format!(
            "The event '{}' is in {} hours at {}. {} [Event ID: {}]",
            event.title, hours, event.start_time, venue, event.id
        );

        let delivered = self
            .fanout
            .fan_out(
                &Audience::Users(registrants),
                &title,
                &message,
                NotificationKind::Event,
                now,
            )
            .await?;

        self.ledger.record(event.id, hours as i32, now).await?;
        tracing::info!(event_id = event.id, hours, delivered, "reminder sent");
        Ok(true)
    }
}

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use learnhub_core::models::{
    event::Event,
    notification::{NewNotification, Notification},
    user::{User, UserRole},
};
use learnhub_core::status::EventStatus;
use learnhub_engine::fanout::NotificationFanout;
use learnhub_engine::mock::{MockEvents, MockNotifications, MockPush, MockReminders, MockUsers};
use learnhub_engine::ports::ReminderLedger;
use learnhub_engine::reminder::{ReminderDeduper, reminder_window};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn event_starting_at(id: i64, start: DateTime<Utc>) -> Event {
    Event {
        id,
        title: "Career Fair".to_string(),
        description: None,
        start_time: start,
        end_time: start + Duration::hours(2),
        online: true,
        location: None,
        meeting_link: Some("https://meet.jit.si/career-fair".to_string()),
        max_participants: None,
        status: EventStatus::Upcoming,
        created_at: now() - Duration::days(14),
    }
}

fn fanout_accepting(publishes: usize) -> NotificationFanout {
    let mut users = MockUsers::new();
    users
        .expect_find_by_ids_with_role()
        .returning(|chunk, _| {
            Ok(chunk
                .iter()
                .map(|&id| User {
                    id,
                    username: format!("user{}", id),
                    role: UserRole::User,
                })
                .collect())
        });

    let next_id = Arc::new(AtomicI64::new(1));
    let mut store = MockNotifications::new();
    store.expect_insert_batch().returning(move |rows| {
        Ok(rows
            .iter()
            .map(|row: &NewNotification| Notification {
                id: next_id.fetch_add(1, Ordering::SeqCst),
                user_id: row.user_id,
                title: row.title.clone(),
                message: row.message.clone(),
                kind: row.kind,
                created_at: row.created_at,
                expires_at: row.expires_at,
                is_read: false,
            })
            .collect())
    });

    let mut push = MockPush::new();
    push.expect_publish()
        .times(publishes)
        .returning(|_, _| Ok(()));

    NotificationFanout::new(Arc::new(users), Arc::new(store), Arc::new(push), 30)
}

/// Real ledger semantics over a HashSet, for exercising the dedup property
/// across repeated sweeps.
#[derive(Default)]
struct MemoryLedger {
    rows: Mutex<HashSet<(i64, i32)>>,
}

#[async_trait]
impl ReminderLedger for MemoryLedger {
    async fn exists(&self, event_id: i64, hours_before: i32) -> eyre::Result<bool> {
        Ok(self.rows.lock().unwrap().contains(&(event_id, hours_before)))
    }

    async fn record(
        &self,
        event_id: i64,
        hours_before: i32,
        _sent_at: DateTime<Utc>,
    ) -> eyre::Result<()> {
        self.rows.lock().unwrap().insert((event_id, hours_before));
        Ok(())
    }
}

#[test]
fn test_reminder_window_is_a_two_hour_band() {
    let (lo, hi) = reminder_window(now(), 24);
    assert_eq!(lo, now() + Duration::hours(23));
    assert_eq!(hi, now() + Duration::hours(25));

    let (lo, hi) = reminder_window(now(), 1);
    assert_eq!(lo, now());
    assert_eq!(hi, now() + Duration::hours(2));
}

#[tokio::test]
async fn test_event_in_band_gets_one_reminder_and_a_ledger_row() {
    // Event starts in 24h10m: inside the 24-hour band.
    let start = now() + Duration::hours(24) + Duration::minutes(10);

    let mut events = MockEvents::new();
    events
        .expect_starting_between()
        .times(1)
        .returning(move |_, _| Ok(vec![event_starting_at(5, start)]));
    events
        .expect_registrant_ids()
        .with(eq(5))
        .returning(|_| Ok(vec![1, 2, 3]));

    let mut ledger = MockReminders::new();
    ledger
        .expect_exists()
        .with(eq(5), eq(24))
        .returning(|_, _| Ok(false));
    ledger
        .expect_record()
        .with(eq(5), eq(24), eq(now()))
        .times(1)
        .returning(|_, _, _| Ok(()));

    let deduper = ReminderDeduper::new(
        Arc::new(events),
        Arc::new(ledger),
        Arc::new(fanout_accepting(3)),
        vec![24],
    );

    assert_eq!(deduper.sweep(now()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_existing_ledger_row_skips_the_send() {
    let start = now() + Duration::hours(24);

    let mut events = MockEvents::new();
    events
        .expect_starting_between()
        .returning(move |_, _| Ok(vec![event_starting_at(5, start)]));
    // No registrant_ids expectation: a skipped event must not be consulted.

    let mut ledger = MockReminders::new();
    ledger.expect_exists().returning(|_, _| Ok(true));

    let deduper = ReminderDeduper::new(
        Arc::new(events),
        Arc::new(ledger),
        Arc::new(fanout_accepting(0)),
        vec![24],
    );

    assert_eq!(deduper.sweep(now()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_no_registrants_sends_nothing_and_records_nothing() {
    let start = now() + Duration::hours(1);

    let mut events = MockEvents::new();
    events
        .expect_starting_between()
        .returning(move |_, _| Ok(vec![event_starting_at(5, start)]));
    events.expect_registrant_ids().returning(|_| Ok(vec![]));

    let mut ledger = MockReminders::new();
    ledger.expect_exists().returning(|_, _| Ok(false));
    // No record expectation: nothing was sent, nothing is gated.

    let deduper = ReminderDeduper::new(
        Arc::new(events),
        Arc::new(ledger),
        Arc::new(fanout_accepting(0)),
        vec![1],
    );

    assert_eq!(deduper.sweep(now()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_second_sweep_in_the_same_window_does_not_resend() {
    // Event starts in 24h10m; an hour later it is 23h10m out. Both sweeps
    // see it in the 24-hour band, only the first sends.
    let start = now() + Duration::hours(24) + Duration::minutes(10);

    let mut events = MockEvents::new();
    events
        .expect_starting_between()
        .times(2)
        .returning(move |lo, hi| {
            if start >= lo && start <= hi {
                Ok(vec![event_starting_at(5, start)])
            } else {
                Ok(vec![])
            }
        });
    events.expect_registrant_ids().returning(|_| Ok(vec![1, 2]));

    let deduper = ReminderDeduper::new(
        Arc::new(events),
        Arc::new(MemoryLedger::default()),
        Arc::new(fanout_accepting(2)),
        vec![24],
    );

    assert_eq!(deduper.sweep(now()).await.unwrap(), 1);
    assert_eq!(deduper.sweep(now() + Duration::hours(1)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_multiple_lead_times_are_tracked_independently() {
    let start = now() + Duration::hours(1) + Duration::minutes(10);

    let mut events = MockEvents::new();
    events
        .expect_starting_between()
        .returning(move |lo, hi| {
            if start >= lo && start <= hi {
                Ok(vec![event_starting_at(5, start)])
            } else {
                Ok(vec![])
            }
        });
    events.expect_registrant_ids().returning(|_| Ok(vec![9]));

    let ledger = Arc::new(MemoryLedger::default());
    let deduper = ReminderDeduper::new(
        Arc::new(events),
        Arc::clone(&ledger) as Arc<dyn ReminderLedger>,
        Arc::new(fanout_accepting(1)),
        vec![24, 1],
    );

    // Only the 1-hour band matches; the 24-hour window saw this event last
    // night in this scenario's past, so exactly one send happens now.
    assert_eq!(deduper.sweep(now()).await.unwrap(), 1);
    assert!(ledger.exists(5, 1).await.unwrap());
    assert!(!ledger.exists(5, 24).await.unwrap());
}

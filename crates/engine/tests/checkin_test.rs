use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use learnhub_core::checkin::{CheckInCode, CheckInOutcome, CheckInRejection};
use learnhub_core::models::event::{Event, EventRegistration};
use learnhub_core::models::user::{User, UserRole};
use learnhub_core::status::EventStatus;
use learnhub_engine::checkin::{CheckInCooldowns, CheckInGuard};
use learnhub_engine::codec;
use learnhub_engine::mock::{MockEvents, MockUsers};
use learnhub_engine::ports::CheckInClaim;

fn event_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

fn test_event(id: i64) -> Event {
    Event {
        id,
        title: "Rust Workshop".to_string(),
        description: None,
        start_time: event_start(),
        end_time: event_start() + Duration::hours(1),
        online: false,
        location: Some("Room 101".to_string()),
        meeting_link: None,
        max_participants: None,
        status: EventStatus::Upcoming,
        created_at: event_start() - Duration::days(7),
    }
}

fn test_user(id: i64) -> User {
    User {
        id,
        username: format!("user{}", id),
        role: UserRole::User,
    }
}

fn registration(event_id: i64, user_id: i64, checked_in: bool) -> EventRegistration {
    EventRegistration {
        id: 1,
        event_id,
        user_id,
        checked_in,
        check_in_time: checked_in.then(|| event_start()),
    }
}

fn code(event_id: i64, user_id: i64) -> String {
    codec::encode(&CheckInCode { event_id, user_id })
}

fn guard(events: MockEvents, users: MockUsers, cooldowns: Arc<CheckInCooldowns>) -> CheckInGuard {
    CheckInGuard::new(Arc::new(events), Arc::new(users), cooldowns)
}

#[tokio::test]
async fn test_malformed_code_is_rejected_before_any_lookup() {
    let guard = guard(
        MockEvents::new(),
        MockUsers::new(),
        Arc::new(CheckInCooldowns::new()),
    );

    let outcome = guard.check_in(5, "definitely not a code", Utc::now()).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::Rejected(CheckInRejection::MalformedCode)
    );
}

#[tokio::test]
async fn test_event_mismatch() {
    let guard = guard(
        MockEvents::new(),
        MockUsers::new(),
        Arc::new(CheckInCooldowns::new()),
    );

    let outcome = guard.check_in(6, &code(5, 42), Utc::now()).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::Rejected(CheckInRejection::EventMismatch)
    );
}

#[tokio::test]
async fn test_missing_event() {
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .with(eq(5))
        .returning(|_| Ok(None));

    let guard = guard(events, MockUsers::new(), Arc::new(CheckInCooldowns::new()));

    let outcome = guard.check_in(5, &code(5, 42), Utc::now()).await.unwrap();

    assert_eq!(outcome, CheckInOutcome::Rejected(CheckInRejection::NotFound));
}

#[tokio::test]
async fn test_missing_user() {
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_event(id))));
    let mut users = MockUsers::new();
    users.expect_find_by_id().returning(|_| Ok(None));

    let guard = guard(events, users, Arc::new(CheckInCooldowns::new()));

    let outcome = guard.check_in(5, &code(5, 42), Utc::now()).await.unwrap();

    assert_eq!(outcome, CheckInOutcome::Rejected(CheckInRejection::NotFound));
}

#[tokio::test]
async fn test_scan_eleven_minutes_early_is_outside_window() {
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_event(id))));
    let mut users = MockUsers::new();
    users
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_user(id))));

    let guard = guard(events, users, Arc::new(CheckInCooldowns::new()));
    let now = event_start() - Duration::minutes(11);

    let outcome = guard.check_in(5, &code(5, 42), now).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::Rejected(CheckInRejection::OutsideWindow)
    );
}

#[tokio::test]
async fn test_scan_nine_minutes_early_is_accepted() {
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_event(id))));
    events
        .expect_find_registration()
        .with(eq(5), eq(42))
        .returning(|e, u| Ok(Some(registration(e, u, false))));
    events
        .expect_claim_check_in()
        .with(eq(5), eq(42), mockall::predicate::always())
        .times(1)
        .returning(|_, _, _| Ok(CheckInClaim::Claimed));
    let mut users = MockUsers::new();
    users
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_user(id))));

    let cooldowns = Arc::new(CheckInCooldowns::new());
    let guard = guard(events, users, Arc::clone(&cooldowns));
    let now = event_start() - Duration::minutes(9);

    let outcome = guard.check_in(5, &code(5, 42), now).await.unwrap();

    assert_eq!(outcome, CheckInOutcome::Accepted { checked_in_at: now });
    // A successful scan arms the cooldown for the pair.
    assert!(cooldowns.active(5, 42, now + Duration::seconds(10)));
}

#[tokio::test]
async fn test_scan_after_end_is_outside_window() {
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_event(id))));
    let mut users = MockUsers::new();
    users
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_user(id))));

    let guard = guard(events, users, Arc::new(CheckInCooldowns::new()));
    let now = event_start() + Duration::hours(1) + Duration::minutes(1);

    let outcome = guard.check_in(5, &code(5, 42), now).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::Rejected(CheckInRejection::OutsideWindow)
    );
}

#[tokio::test]
async fn test_not_registered() {
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_event(id))));
    events
        .expect_find_registration()
        .returning(|_, _| Ok(None));
    let mut users = MockUsers::new();
    users
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_user(id))));

    let guard = guard(events, users, Arc::new(CheckInCooldowns::new()));
    let now = event_start() + Duration::minutes(5);

    let outcome = guard.check_in(5, &code(5, 42), now).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::Rejected(CheckInRejection::NotRegistered)
    );
}

#[tokio::test]
async fn test_persisted_flag_wins_over_cooldown() {
    // The registration already carries a check-in AND a cooldown entry is
    // live: the durable flag must answer, not the cache.
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_event(id))));
    events
        .expect_find_registration()
        .returning(|e, u| Ok(Some(registration(e, u, true))));
    let mut users = MockUsers::new();
    users
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_user(id))));

    let cooldowns = Arc::new(CheckInCooldowns::new());
    let now = event_start() + Duration::minutes(5);
    cooldowns.touch(5, 42, now - Duration::seconds(5));

    let guard = guard(events, users, Arc::clone(&cooldowns));

    let outcome = guard.check_in(5, &code(5, 42), now).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::Rejected(CheckInRejection::AlreadyCheckedIn)
    );
}

#[tokio::test]
async fn test_cooldown_absorbs_duplicate_before_flag_persists() {
    // First scan succeeded moments ago but its write is not yet visible:
    // the cooldown entry still suppresses the duplicate, and no claim is
    // attempted (no expectation is set on claim_check_in).
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_event(id))));
    events
        .expect_find_registration()
        .returning(|e, u| Ok(Some(registration(e, u, false))));
    let mut users = MockUsers::new();
    users
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_user(id))));

    let cooldowns = Arc::new(CheckInCooldowns::new());
    let now = event_start() + Duration::minutes(5);
    cooldowns.touch(5, 42, now - Duration::seconds(10));

    let guard = guard(events, users, Arc::clone(&cooldowns));

    let outcome = guard.check_in(5, &code(5, 42), now).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::Rejected(CheckInRejection::CooldownActive)
    );
}

#[tokio::test]
async fn test_losing_the_claim_race_reports_already_checked_in() {
    // Both validations pass but another writer commits first; the store
    // serializes the claim and this caller must observe the loss.
    let mut events = MockEvents::new();
    events
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_event(id))));
    events
        .expect_find_registration()
        .returning(|e, u| Ok(Some(registration(e, u, false))));
    events
        .expect_claim_check_in()
        .returning(|_, _, _| Ok(CheckInClaim::AlreadyCheckedIn));
    let mut users = MockUsers::new();
    users
        .expect_find_by_id()
        .returning(|id| Ok(Some(test_user(id))));

    let guard = guard(events, users, Arc::new(CheckInCooldowns::new()));
    let now = event_start() + Duration::minutes(5);

    let outcome = guard.check_in(5, &code(5, 42), now).await.unwrap();

    assert_eq!(
        outcome,
        CheckInOutcome::Rejected(CheckInRejection::AlreadyCheckedIn)
    );
}

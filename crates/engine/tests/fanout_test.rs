use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use learnhub_core::models::{
    notification::{Audience, NewNotification, Notification, NotificationKind},
    user::{User, UserRole},
};
use learnhub_engine::fanout::{BATCH_SIZE, CLEANUP_BATCH_SIZE, NotificationFanout};
use learnhub_engine::mock::{MockNotifications, MockPush, MockUsers};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn user(id: i64) -> User {
    User {
        id,
        username: format!("user{}", id),
        role: UserRole::User,
    }
}

/// Turns inserted rows into stored notifications with synthetic ids.
fn store_rows(rows: &[NewNotification], next_id: &AtomicI64) -> Vec<Notification> {
    rows.iter()
        .map(|row| Notification {
            id: next_id.fetch_add(1, Ordering::SeqCst),
            user_id: row.user_id,
            title: row.title.clone(),
            message: row.message.clone(),
            kind: row.kind,
            created_at: row.created_at,
            expires_at: row.expires_at,
            is_read: false,
        })
        .collect()
}

fn accepting_store(insert_calls: usize) -> MockNotifications {
    let mut store = MockNotifications::new();
    let next_id = Arc::new(AtomicI64::new(1));
    store
        .expect_insert_batch()
        .times(insert_calls)
        .returning(move |rows| Ok(store_rows(rows, &next_id)));
    store
}

fn silent_push(publishes: usize) -> MockPush {
    let mut push = MockPush::new();
    push.expect_publish()
        .times(publishes)
        .returning(|_, _| Ok(()));
    push
}

#[tokio::test]
async fn test_empty_explicit_audience_persists_nothing() {
    let fanout = NotificationFanout::new(
        Arc::new(MockUsers::new()),
        Arc::new(MockNotifications::new()),
        Arc::new(MockPush::new()),
        30,
    );

    let total = fanout
        .fan_out(
            &Audience::Users(vec![]),
            "title",
            "message",
            NotificationKind::Event,
            now(),
        )
        .await
        .unwrap();

    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_explicit_audience_is_chunked_into_batches() {
    let ids: Vec<i64> = (1..=250).collect();

    let mut users = MockUsers::new();
    users
        .expect_find_by_ids_with_role()
        .times(3) // 100 + 100 + 50
        .returning(|chunk, _| Ok(chunk.iter().map(|&id| user(id)).collect()));

    let fanout = NotificationFanout::new(
        Arc::new(users),
        Arc::new(accepting_store(3)),
        Arc::new(silent_push(250)),
        30,
    );

    let total = fanout
        .fan_out(
            &Audience::Users(ids),
            "Event Updated",
            "details changed",
            NotificationKind::Event,
            now(),
        )
        .await
        .unwrap();

    assert_eq!(total, 250);
}

#[tokio::test]
async fn test_recipients_outside_role_are_filtered_out() {
    let mut users = MockUsers::new();
    users
        .expect_find_by_ids_with_role()
        .returning(|chunk, _| {
            // Directory says only the first id carries the USER role.
            Ok(chunk.iter().take(1).map(|&id| user(id)).collect())
        });

    let fanout = NotificationFanout::new(
        Arc::new(users),
        Arc::new(accepting_store(1)),
        Arc::new(silent_push(1)),
        30,
    );

    let total = fanout
        .fan_out(
            &Audience::Users(vec![1, 2, 3]),
            "t",
            "m",
            NotificationKind::Event,
            now(),
        )
        .await
        .unwrap();

    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_push_failure_does_not_fail_the_batch() {
    let mut users = MockUsers::new();
    users
        .expect_find_by_ids_with_role()
        .returning(|chunk, _| Ok(chunk.iter().map(|&id| user(id)).collect()));

    let mut push = MockPush::new();
    push.expect_publish()
        .with(eq(1), mockall::predicate::always())
        .returning(|_, _| Err(eyre::eyre!("socket closed")));
    push.expect_publish()
        .with(eq(2), mockall::predicate::always())
        .times(1)
        .returning(|_, _| Ok(()));

    let fanout = NotificationFanout::new(
        Arc::new(users),
        Arc::new(accepting_store(1)),
        Arc::new(push),
        30,
    );

    let total = fanout
        .fan_out(
            &Audience::Users(vec![1, 2]),
            "t",
            "m",
            NotificationKind::Event,
            now(),
        )
        .await
        .expect("push failures must be isolated");

    // Both notifications were persisted despite the failed push.
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_role_audience_pages_until_exhausted() {
    let mut users = MockUsers::new();
    users
        .expect_page_by_role()
        .with(eq(UserRole::User), eq(0), eq(BATCH_SIZE as i64))
        .times(1)
        .returning(|_, _, _| Ok((1..=100).map(user).collect()));
    users
        .expect_page_by_role()
        .with(eq(UserRole::User), eq(100), eq(BATCH_SIZE as i64))
        .times(1)
        .returning(|_, _, _| Ok((101..=130).map(user).collect()));
    users
        .expect_page_by_role()
        .with(eq(UserRole::User), eq(130), eq(BATCH_SIZE as i64))
        .times(1)
        .returning(|_, _, _| Ok(vec![]));

    let fanout = NotificationFanout::new(
        Arc::new(users),
        Arc::new(accepting_store(2)),
        Arc::new(silent_push(130)),
        30,
    );

    let total = fanout
        .fan_out(
            &Audience::all_users(),
            "New Event",
            "m",
            NotificationKind::Event,
            now(),
        )
        .await
        .unwrap();

    assert_eq!(total, 130);
}

#[tokio::test]
async fn test_follower_audience_uses_follower_pages() {
    let mut users = MockUsers::new();
    users
        .expect_page_followers()
        .with(eq(7), eq(0), eq(BATCH_SIZE as i64))
        .times(1)
        .returning(|_, _, _| Ok(vec![user(3), user(9)]));
    users
        .expect_page_followers()
        .with(eq(7), eq(9), eq(BATCH_SIZE as i64))
        .times(1)
        .returning(|_, _, _| Ok(vec![]));

    let fanout = NotificationFanout::new(
        Arc::new(users),
        Arc::new(accepting_store(1)),
        Arc::new(silent_push(2)),
        30,
    );

    let total = fanout
        .fan_out(
            &Audience::followers_of(7),
            "Session Live",
            "m",
            NotificationKind::Session,
            now(),
        )
        .await
        .unwrap();

    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_notify_user_sets_expiry_from_ttl() {
    let next_id = AtomicI64::new(10);
    let mut store = MockNotifications::new();
    store
        .expect_insert_batch()
        .times(1)
        .returning(move |rows| Ok(store_rows(rows, &next_id)));

    let fanout = NotificationFanout::new(
        Arc::new(MockUsers::new()),
        Arc::new(store),
        Arc::new(silent_push(1)),
        30,
    );

    let notification = fanout
        .notify_user(42, "t", "m", NotificationKind::System, now())
        .await
        .unwrap();

    assert_eq!(notification.user_id, 42);
    assert_eq!(notification.expires_at, now() + Duration::days(30));
    assert!(!notification.is_read);
}

#[tokio::test]
async fn test_cleanup_deletes_in_batches_until_empty() {
    let mut store = MockNotifications::new();
    store
        .expect_expired_ids()
        .times(1)
        .with(eq(now()), eq(CLEANUP_BATCH_SIZE))
        .returning(|_, limit| Ok((1..=limit).collect()));
    store
        .expect_delete_by_ids()
        .times(2)
        .returning(|ids| Ok(ids.len() as u64));
    store
        .expect_expired_ids()
        .times(1)
        .returning(|_, _| Ok((1..=300).collect()));

    let fanout = NotificationFanout::new(
        Arc::new(MockUsers::new()),
        Arc::new(store),
        Arc::new(MockPush::new()),
        30,
    );

    let deleted = fanout.cleanup_expired(now()).await.unwrap();

    assert_eq!(deleted, CLEANUP_BATCH_SIZE as u64 + 300);
}

#[tokio::test]
async fn test_cleanup_with_nothing_expired() {
    let mut store = MockNotifications::new();
    store
        .expect_expired_ids()
        .times(1)
        .returning(|_, _| Ok(vec![]));

    let fanout = NotificationFanout::new(
        Arc::new(MockUsers::new()),
        Arc::new(store),
        Arc::new(MockPush::new()),
        30,
    );

    assert_eq!(fanout.cleanup_expired(now()).await.unwrap(), 0);
}

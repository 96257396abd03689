use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use learnhub_core::status::{EventStatus, SessionStatus};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
}

#[rstest]
#[case(at(9, 50), EventStatus::Upcoming)]
#[case(at(10, 0), EventStatus::Ongoing)]
#[case(at(10, 30), EventStatus::Ongoing)]
#[case(at(11, 0), EventStatus::Ongoing)] // end boundary is inclusive for events
#[case(at(11, 1), EventStatus::Ended)]
fn test_event_status_over_window(#[case] now: DateTime<Utc>, #[case] expected: EventStatus) {
    assert_eq!(EventStatus::at(at(10, 0), at(11, 0), now), expected);
}

#[rstest]
#[case(at(9, 59), SessionStatus::Upcoming)]
#[case(at(10, 0), SessionStatus::Live)]
#[case(at(10, 59), SessionStatus::Live)]
#[case(at(11, 0), SessionStatus::Ended)] // end boundary is exclusive for sessions
#[case(at(11, 30), SessionStatus::Ended)]
fn test_session_status_over_window(#[case] now: DateTime<Utc>, #[case] expected: SessionStatus) {
    assert_eq!(SessionStatus::at(at(10, 0), at(11, 0), now), expected);
}

#[test]
fn test_event_status_is_monotonic() {
    let start = at(10, 0);
    let end = at(11, 0);

    let mut seen_ended = false;
    let mut now = at(9, 0);
    while now <= at(13, 0) {
        let status = EventStatus::at(start, end, now);
        if seen_ended {
            assert_eq!(status, EventStatus::Ended, "status reverted at {}", now);
        }
        if status == EventStatus::Ended {
            seen_ended = true;
        }
        now += Duration::seconds(30);
    }
    assert!(seen_ended);
}

#[test]
fn test_session_status_is_monotonic() {
    let start = at(10, 0);
    let end = at(11, 0);

    let mut seen_ended = false;
    let mut now = at(9, 0);
    while now <= at(13, 0) {
        let status = SessionStatus::at(start, end, now);
        if seen_ended {
            assert_eq!(status, SessionStatus::Ended, "status reverted at {}", now);
        }
        if status == SessionStatus::Ended {
            seen_ended = true;
        }
        now += Duration::seconds(30);
    }
    assert!(seen_ended);
}

#[test]
fn test_terminal_statuses() {
    assert!(EventStatus::Ended.is_terminal());
    assert!(!EventStatus::Upcoming.is_terminal());
    assert!(!EventStatus::Ongoing.is_terminal());
    assert!(SessionStatus::Ended.is_terminal());
    assert!(!SessionStatus::Live.is_terminal());
}

#[rstest]
#[case("UPCOMING", Some(EventStatus::Upcoming))]
#[case("ongoing", Some(EventStatus::Ongoing))]
#[case("Ended", Some(EventStatus::Ended))]
#[case("LIVE", None)]
#[case("", None)]
fn test_event_status_parse(#[case] input: &str, #[case] expected: Option<EventStatus>) {
    assert_eq!(EventStatus::parse(input), expected);
}

#[rstest]
#[case("live", Some(SessionStatus::Live))]
#[case("UPCOMING", Some(SessionStatus::Upcoming))]
#[case("ONGOING", None)]
fn test_session_status_parse(#[case] input: &str, #[case] expected: Option<SessionStatus>) {
    assert_eq!(SessionStatus::parse(input), expected);
}

#[test]
fn test_status_round_trips_through_as_str() {
    for status in [EventStatus::Upcoming, EventStatus::Ongoing, EventStatus::Ended] {
        assert_eq!(EventStatus::parse(status.as_str()), Some(status));
    }
    for status in [SessionStatus::Upcoming, SessionStatus::Live, SessionStatus::Ended] {
        assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
    }
}

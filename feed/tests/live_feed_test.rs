use feed::{Backoff, FeedState, LiveFeed};
use std::time::Duration;

#[test]
fn test_close_schedules_growing_retries() {
    let mut feed = LiveFeed::default();
    assert_eq!(feed.state(), &FeedState::Connecting);

    let retries: Vec<Duration> = (0..3)
        .map(|_| {
            assert!(feed.begin_connect());
            feed.on_close("refused").expect("feed is not stopped")
        })
        .collect();

    assert_eq!(
        retries,
        vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!(
        feed.state(),
        &FeedState::Closed {
            retry_in: Duration::from_secs(4)
        }
    );
    assert_eq!(feed.stats().failures, 3);
}

#[test]
fn test_open_resets_backoff() {
    let mut feed = LiveFeed::default();
    feed.on_close("refused");
    feed.on_close("refused");
    feed.begin_connect();
    feed.on_open();

    assert_eq!(feed.state(), &FeedState::Open);
    assert_eq!(feed.stats().connects, 1);
    assert_eq!(feed.on_close("reset by peer"), Some(Duration::from_secs(1)));
}

#[test]
fn test_messages_parse_or_count_as_malformed() {
    let mut feed = LiveFeed::default();
    feed.on_open();

    let event = feed.on_message(r#"{"type": "RoundStart", "time": 0, "round": 1}"#);
    assert_eq!(event.map(|e| e.round), Some(Some(1)));
    assert!(feed.on_message(r#"{"type": "Spawn", "time": 1}"#).is_none());
    assert!(feed.on_message("").is_none());

    let stats = feed.stats();
    assert_eq!(stats.received, 1);
    assert_eq!(stats.malformed, 2);
}

#[test]
fn test_disconnect_is_final() {
    let mut feed = LiveFeed::new(Backoff::new(
        Duration::from_millis(10),
        Duration::from_millis(40),
        2,
    ));
    feed.on_open();
    feed.disconnect();

    assert!(feed.is_stopped());
    assert!(!feed.begin_connect());
    assert_eq!(feed.on_close("late error"), None);
    feed.on_open();
    assert_eq!(feed.state(), &FeedState::Stopped);
    assert_eq!(feed.stats().connects, 1);
}

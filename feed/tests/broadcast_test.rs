use anyhow::Result;
use common::{Event, EventKind, Position, Team};
use feed::{
    Broadcaster, FeedOptions, FeedState, REPLAY_WS_PATH, WsConnector, pacing_delay, pacing_speed,
    spawn_feed,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use url::Url;

const WAIT: Duration = Duration::from_secs(5);

async fn start_server() -> Result<(String, Broadcaster, CancellationToken, tokio::task::JoinHandle<Result<()>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    let broadcaster = Broadcaster::new(64);
    let cancel = CancellationToken::new();
    let server = tokio::spawn(feed::broadcast::serve(
        listener,
        broadcaster.clone(),
        cancel.clone(),
    ));
    Ok((addr, broadcaster, cancel, server))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_published_events_reach_live_feed() -> Result<()> {
    let (addr, broadcaster, cancel, server) = start_server().await?;

    let url = Url::parse(&format!("ws://{}{}", addr, REPLAY_WS_PATH))?;
    let mut handle = spawn_feed(url, Arc::new(WsConnector), FeedOptions::default());
    let mut status = handle.watch();
    timeout(WAIT, status.wait_for(|s| s.state == FeedState::Open)).await??;
    assert_eq!(broadcaster.connection_count(), 1);

    let spawn = Event::new(EventKind::Spawn, 0.5)
        .with_id("spawn-p1")
        .with_actor("p1")
        .with_team(Team::A)
        .with_position([-20.0, 0.0, 1.5])
        .with_round(3);
    let kill = Event::new(EventKind::Kill, 4.25)
        .with_actor("p1")
        .with_target("p2");

    assert_eq!(broadcaster.publish(&spawn), 1);
    assert_eq!(broadcaster.publish(&kill), 1);

    let received = timeout(WAIT, handle.recv()).await?.expect("feed closed");
    assert_eq!(received, spawn);
    assert_eq!(received.position, Some(Position::new(-20.0, 0.0, 1.5)));

    let received = timeout(WAIT, handle.recv()).await?.expect("feed closed");
    assert_eq!(received, kill);
    assert_eq!(received.id.as_str(), "Kill@4.25");

    handle.shutdown().await;
    cancel.cancel();
    timeout(WAIT, server).await???;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_publish_without_viewers_is_dropped() -> Result<()> {
    let broadcaster = Broadcaster::new(8);
    let event = Event::new(EventKind::RoundStart, 0.0).with_round(1);
    assert_eq!(broadcaster.publish(&event), 0);
    assert_eq!(broadcaster.connection_count(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_endpoint() -> Result<()> {
    let (addr, _broadcaster, cancel, server) = start_server().await?;

    let mut stream = TcpStream::connect(&addr).await?;
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await?;
    let mut response = String::new();
    timeout(WAIT, stream.read_to_string(&mut response)).await??;

    assert!(response.starts_with("HTTP/1.1 200"), "unexpected response: {response}");
    assert!(response.ends_with("OK"));

    cancel.cancel();
    timeout(WAIT, server).await???;
    Ok(())
}

#[test]
fn test_pacing_survives_extreme_speeds() {
    assert_eq!(pacing_speed(2.0), 2.0);
    assert_eq!(pacing_speed(1e-300), 0.1);
    assert_eq!(pacing_speed(1e9), 16.0);
    assert_eq!(pacing_speed(0.0), 1.0);
    assert_eq!(pacing_speed(f64::NAN), 1.0);

    assert_eq!(pacing_delay(10.0, 2.0), Some(Duration::from_secs(5)));
    assert_eq!(pacing_delay(-3.0, 1.0), Some(Duration::ZERO));
    // Offsets beyond what a Duration holds are published without waiting
    assert_eq!(pacing_delay(1e300, pacing_speed(1e-300)), None);
    assert_eq!(pacing_delay(f64::INFINITY, 1.0), None);
}

use anyhow::{Context, Result};
use clap::Parser;
use common::{Event, EventId, parse_batch};
use feed::{Broadcaster, pacing_delay, pacing_speed};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Pause between the end of one pass and the start of the next in loop mode
const LOOP_GAP_SECS: f64 = 2.0;

const BROADCAST_CAPACITY: usize = 1024;

#[derive(Parser, Debug)]
#[command(
    name = "replay-broadcast",
    about = "Serve a recorded match log as a live event feed over WebSocket"
)]
struct Args {
    /// Match log to broadcast (JSON array or one event per line)
    file: PathBuf,

    /// Address to listen on
    #[arg(long, env = "REPLAY_BIND", default_value = "0.0.0.0:8765")]
    bind: String,

    /// Playback speed relative to the recorded timing
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Start over when the log runs out
    #[arg(long = "loop")]
    looping: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let speed = pacing_speed(args.speed);
    if speed != args.speed {
        warn!("Speed {} out of range, using {}", args.speed, speed);
    }

    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let batch = parse_batch(&text).context("Failed to parse match log")?;
    if !batch.malformed.is_empty() {
        warn!("Skipped {} malformed events", batch.malformed.len());
    }
    let mut events = batch.events;
    events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    info!("Loaded {} events from {}", events.len(), args.file.display());

    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    let broadcaster = Broadcaster::new(BROADCAST_CAPACITY);
    let cancellation_token = CancellationToken::new();

    let server = tokio::spawn(feed::broadcast::serve(
        listener,
        broadcaster.clone(),
        cancellation_token.clone(),
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
        _ = publish_paced(&broadcaster, &events, speed, args.looping) => {
            info!("Match log finished");
        }
    }

    cancellation_token.cancel();
    server.await??;
    Ok(())
}

async fn publish_paced(broadcaster: &Broadcaster, events: &[Event], speed: f64, looping: bool) {
    let Some(first) = events.first() else {
        warn!("Match log is empty, nothing to broadcast");
        return;
    };
    let origin = first.timestamp;
    let span = events.last().map_or(0.0, |e| e.timestamp - origin) + LOOP_GAP_SECS;
    let started = Instant::now();

    for cycle in 0u32.. {
        for event in events {
            let event = shifted(event, cycle, span);
            match pacing_delay(event.timestamp - origin, speed).and_then(|d| started.checked_add(d)) {
                Some(due) => tokio::time::sleep_until(due).await,
                None => warn!("{} is too far out to schedule, publishing now", event.id),
            }

            let viewers = broadcaster.publish(&event);
            info!("Published {} ({}) to {} viewers", event.id, event.kind, viewers);
        }
        if !looping {
            break;
        }
        info!("Restarting match log, pass {}", cycle + 2);
    }
}

/// Later passes get fresh ids so viewers do not drop them as duplicates.
fn shifted(event: &Event, cycle: u32, span: f64) -> Event {
    let mut event = event.clone();
    if cycle > 0 {
        event.id = EventId(format!("{}#{}", event.id, cycle));
        event.timestamp += span * f64::from(cycle);
    }
    event
}

use anyhow::Result;
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use common::{Event, MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED, to_wire};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const REPLAY_WS_PATH: &str = "/ws/replay";

/// Broadcast pacing uses the same speed range as local playback. Anything
/// that is not a positive number falls back to real time.
pub fn pacing_speed(requested: f64) -> f64 {
    if requested.is_finite() && requested > 0.0 {
        requested.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED)
    } else {
        1.0
    }
}

/// Wall-clock offset at which an event `offset_secs` into the log is due.
/// `None` when the offset does not fit a `Duration`; callers publish at once.
pub fn pacing_delay(offset_secs: f64, speed: f64) -> Option<Duration> {
    Duration::try_from_secs_f64((offset_secs / speed).max(0.0)).ok()
}

/// Fans encoded events out to every connected viewer.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<String>,
    connections: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct ServerState {
    broadcaster: Broadcaster,
    cancellation_token: CancellationToken,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns how many viewers the frame was queued for.
    pub fn publish(&self, event: &Event) -> usize {
        let frame = to_wire(event).to_string();
        self.tx.send(frame).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

pub fn router(broadcaster: Broadcaster, cancellation_token: CancellationToken) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(REPLAY_WS_PATH, get(replay_socket))
        .with_state(ServerState {
            broadcaster,
            cancellation_token,
        })
}

pub async fn serve(
    listener: TcpListener,
    broadcaster: Broadcaster,
    cancellation_token: CancellationToken,
) -> Result<()> {
    let app = router(broadcaster, cancellation_token.clone());
    info!("Replay broadcast listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            info!("Replay broadcast received shutdown signal");
        })
        .await
        .map_err(|e| anyhow::anyhow!("Broadcast server error: {}", e))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn replay_socket(
    ws: WebSocketUpgrade,
    State(state): State<ServerState>,
) -> impl IntoResponse {
    // Subscribe before the upgrade so nothing published after the handshake is missed
    let frames = state.broadcaster.subscribe();
    let connections = state.broadcaster.connections.clone();
    let count = connections.fetch_add(1, Ordering::Relaxed) + 1;
    debug!("Viewer connected, total viewers: {}", count);

    ws.on_upgrade(move |socket| async move {
        forward(socket, frames, state.cancellation_token).await;

        let count = connections.fetch_sub(1, Ordering::Relaxed) - 1;
        debug!("Viewer disconnected, total viewers: {}", count);
    })
}

async fn forward(
    socket: WebSocket,
    mut frames: broadcast::Receiver<String>,
    cancellation_token: CancellationToken,
) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    loop {
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => break,

            frame = frames.recv() => match frame {
                Ok(text) => {
                    if let Err(e) = ws_sink.send(Message::Text(text)).await {
                        error!("Failed to send event to viewer: {}", e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Viewer lagged behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },

            incoming = ws_stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!("Viewer socket error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = ws_sink.close().await;
}

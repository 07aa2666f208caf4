use common::Event;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::{Backoff, Connector, FeedState, FeedStats, FrameStream, LiveFeed};

#[derive(Debug, Clone, Default)]
pub struct FeedOptions {
    pub backoff: Backoff,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedStatus {
    pub state: FeedState,
    pub stats: FeedStats,
}

impl FeedStatus {
    fn of(feed: &LiveFeed) -> Self {
        Self {
            state: feed.state().clone(),
            stats: feed.stats(),
        }
    }
}

/// Consumer side of a running feed. Dropping the handle stops the feed.
pub struct FeedHandle {
    events: mpsc::UnboundedReceiver<Event>,
    status: watch::Receiver<FeedStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

enum Outcome {
    Closed(String),
    Cancelled,
    ConsumerGone,
}

/// Starts a feed task on the current tokio runtime. It keeps reconnecting
/// with backoff until [`FeedHandle::disconnect`] is called or the handle is
/// dropped.
pub fn spawn_feed<C: Connector>(url: Url, connector: Arc<C>, options: FeedOptions) -> FeedHandle {
    let feed = LiveFeed::new(options.backoff);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(FeedStatus::of(&feed));
    let cancel = CancellationToken::new();

    let task = tokio::spawn(run_feed(
        url,
        connector,
        feed,
        events_tx,
        status_tx,
        cancel.clone(),
    ));

    FeedHandle {
        events: events_rx,
        status: status_rx,
        cancel,
        task: Some(task),
    }
}

impl FeedHandle {
    /// Everything received since the last call, without waiting.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Waits for the next event. `None` once the feed has stopped and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn status(&self) -> FeedStatus {
        self.status.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<FeedStatus> {
        self.status.clone()
    }

    /// Stops the feed. Queued events can still be drained.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }

    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_feed<C: Connector>(
    url: Url,
    connector: Arc<C>,
    mut feed: LiveFeed,
    events: mpsc::UnboundedSender<Event>,
    status: watch::Sender<FeedStatus>,
    cancel: CancellationToken,
) {
    info!("Starting live feed from {}", url);

    while feed.begin_connect() {
        status.send_replace(FeedStatus::of(&feed));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Outcome::Cancelled,

            connected = connector.connect(&url) => match connected {
                Ok(frames) => {
                    feed.on_open();
                    status.send_replace(FeedStatus::of(&feed));
                    pump(&mut feed, frames, &events, &status, &cancel).await
                }
                Err(e) => Outcome::Closed(format!("{:#}", e)),
            }
        };

        let reason = match outcome {
            Outcome::Closed(reason) => reason,
            Outcome::Cancelled | Outcome::ConsumerGone => {
                feed.disconnect();
                break;
            }
        };

        let Some(delay) = feed.on_close(&reason) else {
            break;
        };
        status.send_replace(FeedStatus::of(&feed));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => feed.disconnect(),
            _ = tokio::time::sleep(delay) => {}
        }
    }

    status.send_replace(FeedStatus::of(&feed));
    debug!("Live feed task exiting");
}

async fn pump(
    feed: &mut LiveFeed,
    mut frames: FrameStream,
    events: &mpsc::UnboundedSender<Event>,
    status: &watch::Sender<FeedStatus>,
    cancel: &CancellationToken,
) -> Outcome {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,

            frame = frames.next() => match frame {
                Some(Ok(text)) => {
                    if let Some(event) = feed.on_message(&text) {
                        if events.send(event).is_err() {
                            return Outcome::ConsumerGone;
                        }
                    }
                    status.send_replace(FeedStatus::of(feed));
                }
                Some(Err(e)) => return Outcome::Closed(format!("{:#}", e)),
                None => return Outcome::Closed("connection closed".to_string()),
            }
        }
    }
}

use common::{Event, parse_event};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::Backoff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Connecting,
    Open,
    /// Transport dropped; a reconnect is scheduled after `retry_in`.
    Closed { retry_in: Duration },
    /// `disconnect` was called. No further reconnects.
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub connects: u64,
    pub failures: u64,
    pub received: u64,
    pub malformed: u64,
}

/// Transport-agnostic reconnect state machine.
///
/// The feed turns inbound frames into events and hands them on; it keeps no
/// history of its own. Timers and sockets live with the caller (see
/// [`crate::spawn_feed`]), which keeps the machine testable without a network.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    state: FeedState,
    backoff: Backoff,
    stats: FeedStats,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new(Backoff::default())
    }
}

impl LiveFeed {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            state: FeedState::Connecting,
            backoff,
            stats: FeedStats::default(),
        }
    }

    /// Enters `Connecting`. Returns false once the feed has been stopped.
    pub fn begin_connect(&mut self) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.state = FeedState::Connecting;
        true
    }

    pub fn on_open(&mut self) {
        if self.is_stopped() {
            return;
        }
        self.state = FeedState::Open;
        self.backoff.reset();
        self.stats.connects += 1;
        info!("Live feed connected");
    }

    /// Parses one frame. Malformed frames are logged and dropped.
    pub fn on_message(&mut self, text: &str) -> Option<Event> {
        match parse_event(text) {
            Ok(event) => {
                self.stats.received += 1;
                debug!("Live event {} ({})", event.id, event.kind);
                Some(event)
            }
            Err(err) => {
                self.stats.malformed += 1;
                warn!("Dropping malformed live frame: {}", err);
                None
            }
        }
    }

    /// Handles an error or close. Returns the delay before the next attempt,
    /// or `None` if the feed was stopped and must not reconnect.
    pub fn on_close(&mut self, reason: &str) -> Option<Duration> {
        if self.is_stopped() {
            return None;
        }
        let retry_in = self.backoff.next_delay();
        self.stats.failures += 1;
        self.state = FeedState::Closed { retry_in };
        warn!(
            "Live feed closed ({}), reconnecting in {}ms",
            reason,
            retry_in.as_millis()
        );
        Some(retry_in)
    }

    pub fn disconnect(&mut self) {
        if !self.is_stopped() {
            info!("Live feed stopped");
        }
        self.state = FeedState::Stopped;
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    pub fn is_stopped(&self) -> bool {
        self.state == FeedState::Stopped
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }
}

mod backoff;
mod live_feed;
mod runner;
mod transport;

pub mod broadcast;

pub use backoff::*;
pub use live_feed::*;
pub use runner::*;
pub use transport::*;
pub use broadcast::{Broadcaster, REPLAY_WS_PATH, pacing_delay, pacing_speed};

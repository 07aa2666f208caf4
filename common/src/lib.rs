mod clock;
mod config;
mod constants;
mod director;
mod engine;
mod entity;
mod event;
mod event_log;
mod projector;

pub mod timeline;
pub mod wire;

pub use clock::*;
pub use config::*;
pub use constants::*;
pub use director::*;
pub use engine::*;
pub use entity::*;
pub use event::*;
pub use event_log::*;
pub use projector::*;
pub use timeline::{Timeline, format_clock};
pub use wire::{ParseError, ParsedBatch, parse_batch, parse_event, to_wire};

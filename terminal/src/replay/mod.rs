pub mod reader;

use common::Event;
use std::path::PathBuf;

/// A match log ready to hand to the engine.
#[derive(Debug, Clone, Default)]
pub struct ReplayData {
    pub name: String,
    pub source: Option<PathBuf>,
    pub events: Vec<Event>,
    /// Entries in the file that could not be parsed.
    pub malformed: usize,
}

impl ReplayData {
    /// No recorded events, for a viewer that only shows the live feed.
    pub fn live(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

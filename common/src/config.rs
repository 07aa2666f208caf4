use serde::{Deserialize, Serialize};

use crate::{DEFAULT_CAMERA_COOLDOWN_SECS, DEFAULT_CAMERA_SWITCH_THRESHOLD, DEFAULT_TRAIL_CAP};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Positions retained per entity trail before the oldest is evicted.
    pub trail_cap: usize,
    /// Empty the entity arena before a seek-driven rebuild. Turning this off
    /// replays onto whatever was visible before the seek.
    pub clear_on_seek: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trail_cap: DEFAULT_TRAIL_CAP,
            clear_on_seek: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Seconds after a switch during which further switches are suppressed.
    pub cooldown_secs: f64,
    pub switch_threshold: u32,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_CAMERA_COOLDOWN_SECS,
            switch_threshold: DEFAULT_CAMERA_SWITCH_THRESHOLD,
        }
    }
}

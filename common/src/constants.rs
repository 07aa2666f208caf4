/// Maximum number of recent positions kept per entity trail
pub const DEFAULT_TRAIL_CAP: usize = 50;

/// Playback speed bounds for the replay clock
pub const MIN_PLAYBACK_SPEED: f64 = 0.1;
pub const MAX_PLAYBACK_SPEED: f64 = 16.0;

/// Distance of each team's spawn column from the map center on the x axis
pub const TEAM_SPAWN_OFFSET_X: f32 = 20.0;

/// Spacing between entities inside a team's spawn column
pub const TEAM_SPAWN_SPACING: f32 = 2.0;

/// Default camera switch cooldown in seconds
pub const DEFAULT_CAMERA_COOLDOWN_SECS: f64 = 3.0;

/// Default minimum score for the director to consider switching
pub const DEFAULT_CAMERA_SWITCH_THRESHOLD: u32 = 20;

use log::warn;

use crate::{MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED};

/// Authoritative playback time. Advanced by the host's render loop, never by
/// wall-clock time directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayClock {
    current_time: f64,
    speed: f64,
    paused: bool,
}

impl Default for ReplayClock {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            speed: 1.0,
            paused: false,
        }
    }
}

impl ReplayClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Moves forward by `dt * speed` unless paused, staying inside `[0, duration]`.
    /// Negative or non-finite deltas do not move the clock.
    pub fn advance(&mut self, dt: f64, duration: f64) {
        if self.paused || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.current_time = clamp_time(self.current_time + dt * self.speed, duration);
    }

    /// Jumps to `t`, clamped to `[0, duration]`. Returns the time actually set.
    pub fn set(&mut self, t: f64, duration: f64) -> f64 {
        self.current_time = if t.is_finite() {
            clamp_time(t, duration)
        } else {
            0.0
        };
        self.current_time
    }

    pub fn rewind(&mut self) {
        self.current_time = 0.0;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn set_speed(&mut self, speed: f64) -> f64 {
        if !speed.is_finite() || speed <= 0.0 {
            warn!("Ignoring invalid playback speed {}", speed);
            return self.speed;
        }
        self.speed = speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
        self.speed
    }
}

fn clamp_time(t: f64, duration: f64) -> f64 {
    t.clamp(0.0, duration.max(0.0))
}

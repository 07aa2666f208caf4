use crate::{ReplayEngine, Step};

/// Scrub-bar view over the engine. Holds no state of its own, so it cannot
/// drift from the replay clock.
pub struct Timeline<'a> {
    engine: &'a mut ReplayEngine,
}

impl<'a> Timeline<'a> {
    pub fn new(engine: &'a mut ReplayEngine) -> Self {
        Self { engine }
    }

    /// Seeks to a scrub position in `[0, 100]`. Out of range values are clamped.
    pub fn seek(&mut self, percent: f64) -> Step {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let target = percent / 100.0 * self.engine.duration();
        self.engine.seek(target)
    }

    /// Nudges the scrub position by `delta` percentage points.
    pub fn seek_by(&mut self, delta: f64) -> Step {
        let percent = self.percent() + delta;
        self.seek(percent)
    }

    /// Fraction of the log played so far, 0 for an empty log.
    pub fn progress(&self) -> f64 {
        progress(self.engine)
    }

    pub fn percent(&self) -> f64 {
        self.progress() * 100.0
    }

    pub fn current_label(&self) -> String {
        format_clock(self.engine.current_time())
    }

    pub fn duration_label(&self) -> String {
        format_clock(self.engine.duration())
    }
}

/// Read-only progress for callers that only hold a shared reference.
pub fn progress(engine: &ReplayEngine) -> f64 {
    let duration = engine.duration();
    if duration <= 0.0 {
        return 0.0;
    }
    (engine.current_time() / duration).clamp(0.0, 1.0)
}

/// Formats seconds as `mm:ss`. Minutes keep counting past an hour.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

use log::{debug, info, warn};
use std::collections::HashSet;

use crate::wire::{ParseError, parse_batch};
use crate::{
    EngineConfig, EntityId, EntityState, Event, EventConsumer, EventId, EventLog, Projector,
    ReplayClock,
};

/// Why a batch of events was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Normal forward playback from `tick`.
    Playback,
    /// Recompute from the origin after a seek.
    Rebuild,
}

/// Events applied by one `tick` or `seek`, in the order the projector saw them.
#[derive(Debug, Clone)]
pub struct Step {
    pub pass: Pass,
    pub applied: Vec<Event>,
}

impl Step {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Hands the applied events to downstream consumers in apply order.
    /// Consumers see the state as it is after the whole step.
    pub fn deliver(&self, state: &EntityState, consumers: &mut [&mut dyn EventConsumer]) {
        if self.pass == Pass::Rebuild {
            for consumer in consumers.iter_mut() {
                consumer.on_reset();
            }
        }
        for event in &self.applied {
            for consumer in consumers.iter_mut() {
                consumer.on_event(event, state, self.pass);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Projector applications across all passes.
    pub applied: u64,
    pub duplicates: u64,
    pub malformed: u64,
    pub rebuilds: u64,
}

/// Drives the projector from the event log according to the replay clock.
///
/// Single-threaded: `tick`, `seek`, `load` and `reset` run to completion and
/// are the only paths that reach the projector, so the entity state has
/// exactly one writer.
pub struct ReplayEngine {
    config: EngineConfig,
    log: EventLog,
    clock: ReplayClock,
    projector: Projector,
    state: EntityState,
    applied: HashSet<EventId>,
    stats: EngineStats,
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ReplayEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            projector: Projector::new(config.trail_cap),
            config,
            log: EventLog::new(),
            clock: ReplayClock::new(),
            state: EntityState::new(),
            applied: HashSet::new(),
            stats: EngineStats::default(),
        }
    }

    /// Replaces the history and rewinds to time zero with an empty world.
    /// Returns the number of events accepted into the log.
    pub fn load(&mut self, events: Vec<Event>) -> usize {
        let total = events.len();
        let valid: Vec<Event> = events
            .into_iter()
            .filter(|event| self.accept_valid(event))
            .collect();

        let duplicates = self.log.load(valid);
        self.stats.duplicates += duplicates as u64;
        self.clock.rewind();
        self.applied.clear();
        self.projector.clear(&mut self.state);

        info!(
            "Loaded {} of {} events spanning {:.2}s",
            self.log.len(),
            total,
            self.log.duration()
        );
        self.log.len()
    }

    /// Parses a JSON array or JSON-lines match log and loads it.
    pub fn load_json(&mut self, text: &str) -> Result<usize, ParseError> {
        let batch = parse_batch(text)?;
        self.stats.malformed += batch.malformed.len() as u64;
        Ok(self.load(batch.events))
    }

    /// Live append. The event is applied by the next `tick` once the clock
    /// reaches it; returns false if it was malformed or already logged.
    pub fn append(&mut self, event: Event) -> bool {
        if !self.accept_valid(&event) {
            return false;
        }
        if !self.log.append(event) {
            self.stats.duplicates += 1;
            return false;
        }
        true
    }

    pub fn tick(&mut self, dt: f64) -> Step {
        self.clock.advance(dt, self.log.duration());
        self.apply_due(Pass::Playback)
    }

    /// Jumps to `t` (clamped to the log's range) and recomputes the world
    /// from the origin. Projector transitions are not invertible, so this is
    /// always a full replay rather than a diff.
    pub fn seek(&mut self, t: f64) -> Step {
        let target = self.clock.set(t, self.log.duration());
        if target != t {
            debug!("Seek to {} clamped to {}", t, target);
        }

        self.applied.clear();
        if self.config.clear_on_seek {
            self.projector.clear(&mut self.state);
        }
        self.stats.rebuilds += 1;
        self.apply_due(Pass::Rebuild)
    }

    pub fn reset(&mut self) {
        self.clock.rewind();
        self.applied.clear();
        self.projector.clear(&mut self.state);
    }

    pub fn remove_entity(&mut self, id: &EntityId) -> bool {
        self.projector.remove(&mut self.state, id)
    }

    fn apply_due(&mut self, pass: Pass) -> Step {
        let now = self.clock.current_time();
        let mut applied = Vec::new();

        for idx in self.log.ordered_until(now) {
            let event = &self.log.events()[idx];
            if !self.applied.insert(event.id.clone()) {
                continue;
            }
            self.projector.apply(&mut self.state, event);
            applied.push(event.clone());
        }

        self.stats.applied += applied.len() as u64;
        Step { pass, applied }
    }

    fn accept_valid(&mut self, event: &Event) -> bool {
        match event.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!("Dropping malformed event {}: {}", event.id, err);
                self.stats.malformed += 1;
                false
            }
        }
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.clock.toggle_pause()
    }

    pub fn set_speed(&mut self, speed: f64) -> f64 {
        self.clock.set_speed(speed)
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn clock(&self) -> &ReplayClock {
        &self.clock
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn duration(&self) -> f64 {
        self.log.duration()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn speed(&self) -> f64 {
        self.clock.speed()
    }

    pub fn is_applied(&self, id: &EventId) -> bool {
        self.applied.contains(id)
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

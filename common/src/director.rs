use log::{debug, trace};

use crate::{DirectorConfig, EntityId, EntityState, Event, EventKind, Pass};

/// Downstream observer of applied events (camera logic, heatmaps, UI).
///
/// Consumers receive events through the same ordered, deduplicated path as the
/// projector and only ever get a shared reference to the entity state.
pub trait EventConsumer {
    fn on_event(&mut self, event: &Event, state: &EntityState, pass: Pass);

    /// Periodic host tick, in seconds.
    fn update(&mut self, _dt: f64) {}

    /// Called before the events of a rebuild are delivered.
    fn on_reset(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Priority(pub u32);

pub trait EventScorer {
    fn score(&self, event: &Event) -> Priority;
}

/// Fixed priority per event kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindScorer;

impl EventScorer for KindScorer {
    fn score(&self, event: &Event) -> Priority {
        let score = match event.kind {
            EventKind::Kill => 100,
            EventKind::RoundStart => 60,
            EventKind::RoundEnd => 40,
            EventKind::Spawn => 20,
            EventKind::Move => 1,
            EventKind::Other(_) => 0,
        };
        Priority(score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewpoint {
    #[default]
    Overview,
    Follow(EntityId),
}

/// Picks a viewpoint from the event stream, holding each choice for a
/// cooldown window during which further switches are suppressed.
pub struct CameraDirector<S: EventScorer = KindScorer> {
    config: DirectorConfig,
    scorer: S,
    viewpoint: Viewpoint,
    cooldown: f64,
    switches: u64,
}

impl CameraDirector<KindScorer> {
    pub fn new(config: DirectorConfig) -> Self {
        Self::with_scorer(config, KindScorer)
    }
}

impl Default for CameraDirector<KindScorer> {
    fn default() -> Self {
        Self::new(DirectorConfig::default())
    }
}

impl<S: EventScorer> CameraDirector<S> {
    pub fn with_scorer(config: DirectorConfig, scorer: S) -> Self {
        Self {
            config,
            scorer,
            viewpoint: Viewpoint::Overview,
            cooldown: 0.0,
            switches: 0,
        }
    }

    pub fn viewpoint(&self) -> &Viewpoint {
        &self.viewpoint
    }

    pub fn cooldown_remaining(&self) -> f64 {
        self.cooldown
    }

    pub fn switches(&self) -> u64 {
        self.switches
    }

    fn focus_for(event: &Event, state: &EntityState) -> Viewpoint {
        // Killer first, then victim
        [event.actor.as_ref(), event.target.as_ref()]
            .into_iter()
            .flatten()
            .find(|id| state.contains(id))
            .map(|id| Viewpoint::Follow(id.clone()))
            .unwrap_or(Viewpoint::Overview)
    }
}

impl<S: EventScorer> EventConsumer for CameraDirector<S> {
    fn on_event(&mut self, event: &Event, state: &EntityState, pass: Pass) {
        // Rebuilds replay history; cutting the camera through it is noise
        if pass == Pass::Rebuild {
            return;
        }

        // Round boundaries cut to the overview whatever their score
        let round_boundary = matches!(event.kind, EventKind::RoundStart | EventKind::RoundEnd);
        let score = self.scorer.score(event);
        if !round_boundary && score.0 < self.config.switch_threshold {
            return;
        }
        if self.cooldown > 0.0 {
            trace!(
                "Camera switch for {} suppressed, {:.2}s cooldown left",
                event.id,
                self.cooldown
            );
            return;
        }

        let next = if round_boundary {
            Viewpoint::Overview
        } else {
            Self::focus_for(event, state)
        };
        if next == self.viewpoint {
            return;
        }

        debug!("Camera -> {:?} (score {} from {})", next, score.0, event.id);
        self.viewpoint = next;
        self.cooldown = self.config.cooldown_secs;
        self.switches += 1;
    }

    fn update(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }
    }

    fn on_reset(&mut self) {
        self.viewpoint = Viewpoint::Overview;
        self.cooldown = 0.0;
    }
}

use log::trace;

use crate::{
    Entity, EntityId, EntityState, EntityStatus, Event, EventKind, Position, TEAM_SPAWN_OFFSET_X,
    TEAM_SPAWN_SPACING, Team,
};

/// Folds events into [`EntityState`]. The only code allowed to change it.
///
/// Every transition is total: events that reference absent or dead entities
/// are no-ops, so the projector can be fed any order of events (seek replays
/// may present a `Move` whose `Spawn` was dropped or deduplicated).
#[derive(Debug, Clone)]
pub struct Projector {
    trail_cap: usize,
}

impl Projector {
    pub fn new(trail_cap: usize) -> Self {
        Self {
            trail_cap: trail_cap.max(1),
        }
    }

    pub fn trail_cap(&self) -> usize {
        self.trail_cap
    }

    pub fn apply(&self, state: &mut EntityState, event: &Event) {
        match &event.kind {
            EventKind::RoundStart => self.respawn_all(state),

            EventKind::Spawn => {
                let (Some(actor), Some(position)) = (&event.actor, event.position) else {
                    return;
                };
                let team = event
                    .team
                    .clone()
                    .or_else(|| state.get(actor).and_then(|e| e.team.clone()));
                state.insert(actor.clone(), Entity::spawned(position, team));
            }

            EventKind::Move => {
                let (Some(actor), Some(position)) = (&event.actor, event.position) else {
                    return;
                };
                match state.get_mut(actor) {
                    Some(entity) if entity.is_alive() => {
                        entity.trail.push_back(position);
                        while entity.trail.len() > self.trail_cap {
                            entity.trail.pop_front();
                        }
                        entity.position = position;
                    }
                    _ => trace!("Ignoring move for absent or dead entity {}", actor),
                }
            }

            EventKind::Kill => {
                let Some(target) = &event.target else {
                    return;
                };
                if let Some(entity) = state.get_mut(target) {
                    if entity.is_alive() {
                        entity.status = EntityStatus::Dead {
                            at: event.timestamp,
                        };
                    }
                }
            }

            // Extension point for round summaries
            EventKind::RoundEnd => {}

            EventKind::Other(kind) => trace!("No transition for event kind {}", kind),
        }
    }

    pub fn remove(&self, state: &mut EntityState, id: &EntityId) -> bool {
        state.remove(id).is_some()
    }

    pub fn clear(&self, state: &mut EntityState) {
        state.clear();
    }

    /// Puts every known entity back on its team's spawn column. The first half
    /// of the ids (in id order) becomes team A, the rest team B.
    fn respawn_all(&self, state: &mut EntityState) {
        let ids: Vec<EntityId> = state.ids().cloned().collect();
        let team_a_count = ids.len().div_ceil(2);
        let team_b_count = ids.len() - team_a_count;

        for (idx, id) in ids.into_iter().enumerate() {
            let (team, slot, count, x) = if idx < team_a_count {
                (Team::A, idx, team_a_count, -TEAM_SPAWN_OFFSET_X)
            } else {
                (Team::B, idx - team_a_count, team_b_count, TEAM_SPAWN_OFFSET_X)
            };
            let position = spawn_slot(x, slot, count);
            state.insert(id, Entity::spawned(position, Some(team)));
        }
    }
}

fn spawn_slot(x: f32, slot: usize, count: usize) -> Position {
    let center = (count.saturating_sub(1)) as f32 / 2.0;
    Position::new(x, 0.0, (slot as f32 - center) * TEAM_SPAWN_SPACING)
}

use super::traits::EntityRenderer;
use super::types::{CharGrid, RenderConfig};
use common::{EntityId, EntityState, Position};

/// Smallest half-width of the visible pitch, in world units. Keeps the two
/// team spawn lines on screen before anyone has moved.
pub const MIN_HALF_EXTENT: f32 = 25.0;

/// World-space rectangle on the x/z plane that maps onto the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for PitchBounds {
    fn default() -> Self {
        Self {
            min_x: -MIN_HALF_EXTENT,
            max_x: MIN_HALF_EXTENT,
            min_z: -MIN_HALF_EXTENT,
            max_z: MIN_HALF_EXTENT,
        }
    }
}

impl PitchBounds {
    /// The default extent grown to cover every entity and trail point.
    pub fn around(state: &EntityState) -> Self {
        let mut bounds = Self::default();
        for (_, entity) in state.iter() {
            for position in entity.trail.iter().chain(std::iter::once(&entity.position)) {
                bounds.include(*position);
            }
        }
        bounds
    }

    fn include(&mut self, position: Position) {
        if !position.x.is_finite() || !position.z.is_finite() {
            return;
        }
        self.min_x = self.min_x.min(position.x);
        self.max_x = self.max_x.max(position.x);
        self.min_z = self.min_z.min(position.z);
        self.max_z = self.max_z.max(position.z);
    }

    /// Grid point for a world position. +z is up the screen.
    pub fn project(&self, position: Position, width: usize, height: usize) -> Option<(usize, usize)> {
        if width == 0 || height == 0 {
            return None;
        }
        let fx = (position.x - self.min_x) / (self.max_x - self.min_x);
        let fz = (self.max_z - position.z) / (self.max_z - self.min_z);
        if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fz) {
            return None;
        }

        let column = (fx * (width - 1) as f32).round() as usize;
        let row = (fz * (height - 1) as f32).round() as usize;
        Some((column, row))
    }
}

pub struct PitchRenderer<R: EntityRenderer> {
    renderer: R,
}

impl<R: EntityRenderer> PitchRenderer<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// Draws trails first, then dead entities, then the living, and the
    /// followed entity last so nothing covers it.
    pub fn render(
        &self,
        state: &EntityState,
        focus: Option<&EntityId>,
        width: usize,
        height: usize,
        config: &RenderConfig,
    ) -> CharGrid {
        let mut grid = CharGrid::new(width, height, config.chars_per_point);
        let bounds = PitchBounds::around(state);

        for (_, entity) in state.iter() {
            let pattern = self.renderer.render_trail(entity);
            // The newest trail point is the entity itself
            let history = entity.trail.len().saturating_sub(1);
            for position in entity.trail.iter().take(history) {
                if let Some((x, y)) = bounds.project(*position, width, height) {
                    grid.set_logical_point(x, y, &pattern);
                }
            }
        }

        let mut ordered: Vec<_> = state.iter().collect();
        ordered.sort_by_key(|(id, entity)| (Some(*id) == focus, entity.is_alive()));

        for (id, entity) in ordered {
            let followed = Some(id) == focus;
            if let Some((x, y)) = bounds.project(entity.position, width, height) {
                let pattern = self.renderer.render_entity(entity, followed);
                grid.set_logical_point(x, y, &pattern);
            }
        }

        grid
    }
}

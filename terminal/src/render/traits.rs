use super::types::CharPattern;
use common::Entity;

pub trait EntityRenderer {
    /// `followed` is set for the entity the camera is tracking.
    fn render_entity(&self, entity: &Entity, followed: bool) -> CharPattern;

    fn render_trail(&self, entity: &Entity) -> CharPattern;
}

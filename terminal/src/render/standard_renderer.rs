use super::traits::EntityRenderer;
use super::types::{CharDimensions, CharPattern};
use common::{Entity, EntityStatus, Team};
use ratatui::style::{Color, Modifier, Style};

pub const TEAM_A_GLYPH: char = '▲';
pub const TEAM_B_GLYPH: char = '▼';
pub const NEUTRAL_GLYPH: char = '◆';
pub const DEAD_GLYPH: char = '✕';
pub const TRAIL_GLYPH: char = '·';

pub struct StandardRenderer {
    char_dims: CharDimensions,
}

impl StandardRenderer {
    pub fn new(char_dims: CharDimensions) -> Self {
        Self { char_dims }
    }
}

pub fn team_color(team: Option<&Team>) -> Color {
    match team {
        Some(Team::A) => Color::Cyan,
        Some(Team::B) => Color::Red,
        Some(Team::Named(_)) | None => Color::Yellow,
    }
}

impl EntityRenderer for StandardRenderer {
    fn render_entity(&self, entity: &Entity, followed: bool) -> CharPattern {
        let (glyph, mut style) = match entity.status {
            EntityStatus::Dead { .. } => (
                DEAD_GLYPH,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            ),
            EntityStatus::Alive => {
                let glyph = match entity.team {
                    Some(Team::A) => TEAM_A_GLYPH,
                    Some(Team::B) => TEAM_B_GLYPH,
                    _ => NEUTRAL_GLYPH,
                };
                (
                    glyph,
                    Style::default()
                        .fg(team_color(entity.team.as_ref()))
                        .add_modifier(Modifier::BOLD),
                )
            }
        };

        if followed {
            style = style.add_modifier(Modifier::REVERSED);
        }
        CharPattern::leading(glyph, self.char_dims, style)
    }

    fn render_trail(&self, entity: &Entity) -> CharPattern {
        let style = Style::default()
            .fg(team_color(entity.team.as_ref()))
            .add_modifier(Modifier::DIM);
        CharPattern::leading(TRAIL_GLYPH, self.char_dims, style)
    }
}

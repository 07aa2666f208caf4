use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ParseError;

/// Identifier of a visualized entity (player, bot, projectile...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity used for deduplication. Two events with the same id are
/// the same event, whatever their payloads say.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Id used when the source does not supply one: kind plus timestamp.
    pub fn synthesize(kind: &EventKind, timestamp: f64) -> Self {
        EventId(format!("{}@{}", kind, timestamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        EventId(value.to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Position {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Position { x, y, z }
    }
}

impl From<Position> for [f32; 3] {
    fn from(position: Position) -> Self {
        position.to_array()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Team {
    A,
    B,
    Named(String),
}

impl Team {
    /// Maps the side names different titles use onto the two halves of the grid.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "a" | "team_a" | "attackers" | "attack" | "blue" | "t" => Team::A,
            "b" | "team_b" | "defenders" | "defense" | "red" | "ct" => Team::B,
            _ => Team::Named(tag.trim().to_string()),
        }
    }
}

impl From<String> for Team {
    fn from(value: String) -> Self {
        Team::parse(&value)
    }
}

impl From<Team> for String {
    fn from(team: Team) -> Self {
        team.to_string()
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => f.write_str("A"),
            Team::B => f.write_str("B"),
            Team::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    RoundStart,
    Kill,
    Move,
    Spawn,
    RoundEnd,
    /// Unrecognized wire type. Accepted into the log, ignored by the projector.
    Other(String),
}

impl EventKind {
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "roundstart" => EventKind::RoundStart,
            "kill" => EventKind::Kill,
            "move" => EventKind::Move,
            "spawn" => EventKind::Spawn,
            "roundend" => EventKind::RoundEnd,
            _ => EventKind::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::RoundStart => "RoundStart",
            EventKind::Kill => "Kill",
            EventKind::Move => "Move",
            EventKind::Spawn => "Spawn",
            EventKind::RoundEnd => "RoundEnd",
            EventKind::Other(raw) => raw,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One thing that happened in the match. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    /// Seconds. Either relative match time or seconds since the Unix epoch,
    /// depending on what the source sent.
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

impl Event {
    pub fn new(kind: EventKind, timestamp: f64) -> Self {
        Self {
            id: EventId::synthesize(&kind, timestamp),
            kind,
            timestamp,
            actor: None,
            target: None,
            team: None,
            position: None,
            round: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = EventId(id.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<EntityId>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<EntityId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_position(mut self, position: impl Into<Position>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    /// Checks the fields each kind needs before the projector can use it.
    pub fn validate(&self) -> Result<(), ParseError> {
        if !self.timestamp.is_finite() {
            return Err(ParseError::NonFiniteTime);
        }

        let missing = |field: &'static str| ParseError::MissingField {
            kind: self.kind.to_string(),
            field,
        };

        match self.kind {
            EventKind::Spawn | EventKind::Move => {
                if self.actor.is_none() {
                    return Err(missing("actor"));
                }
                if self.position.is_none() {
                    return Err(missing("payload.position"));
                }
            }
            EventKind::Kill => {
                if self.target.is_none() {
                    return Err(missing("target"));
                }
            }
            EventKind::RoundStart | EventKind::RoundEnd | EventKind::Other(_) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_normalized() {
        assert_eq!(EventKind::parse("ROUND_START"), EventKind::RoundStart);
        assert_eq!(EventKind::parse("round-end"), EventKind::RoundEnd);
        assert_eq!(EventKind::parse("Kill"), EventKind::Kill);
        assert_eq!(
            EventKind::parse("plant_bomb"),
            EventKind::Other("plant_bomb".to_string())
        );
    }

    #[test]
    fn synthesized_id_ignores_payload() {
        let a = Event::new(EventKind::Move, 1.5).with_actor("p1");
        let b = Event::new(EventKind::Move, 1.5).with_actor("p2");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.as_str(), "Move@1.5");
    }

    #[test]
    fn team_aliases() {
        assert_eq!(Team::parse("Attackers"), Team::A);
        assert_eq!(Team::parse("ct"), Team::B);
        assert_eq!(Team::parse("Sentinels"), Team::Named("Sentinels".into()));
    }
}

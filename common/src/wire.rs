use chrono::{DateTime, NaiveDateTime};
use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::{EntityId, Event, EventId, EventKind, Position, Team};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event has neither `type` nor `event_type`")]
    MissingKind,
    #[error("event has neither `timestamp` nor `time`")]
    MissingTime,
    #[error("unreadable timestamp {0:?}")]
    BadTimestamp(String),
    #[error("event time is not a finite number")]
    NonFiniteTime,
    #[error("{kind} event is missing `{field}`")]
    MissingField { kind: String, field: &'static str },
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: Option<String>,
    event_type: Option<String>,
    timestamp: Option<Value>,
    time: Option<f64>,
    actor: Option<Value>,
    target: Option<Value>,
    team: Option<Value>,
    round: Option<Value>,
    #[serde(default)]
    payload: Option<WirePayload>,
    event_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct WirePayload {
    position: Option<[f32; 3]>,
    team: Option<Value>,
    round: Option<Value>,
    round_no: Option<Value>,
}

/// Events parsed from a bulk source plus everything that had to be dropped.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub events: Vec<Event>,
    pub malformed: Vec<ParseError>,
}

/// Parses one inbound wire message into an [`Event`].
pub fn parse_event(text: &str) -> Result<Event, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    event_from_value(value)
}

pub fn event_from_value(value: Value) -> Result<Event, ParseError> {
    let wire: WireEvent = serde_json::from_value(value)?;

    let kind = wire
        .kind
        .or(wire.event_type)
        .map(|raw| EventKind::parse(&raw))
        .ok_or(ParseError::MissingKind)?;

    // Wall-clock wins over relative time when both are present
    let timestamp = match (wire.timestamp, wire.time) {
        (Some(ts), _) => wall_clock_seconds(&ts)?,
        (None, Some(time)) => time,
        (None, None) => return Err(ParseError::MissingTime),
    };

    let payload = wire.payload.unwrap_or_default();
    let id = match wire.event_id.and_then(value_to_string) {
        Some(id) => EventId(id),
        None => EventId::synthesize(&kind, timestamp),
    };

    let event = Event {
        id,
        kind,
        timestamp,
        actor: wire.actor.and_then(value_to_string).map(EntityId),
        target: wire.target.and_then(value_to_string).map(EntityId),
        team: [wire.team, payload.team]
            .into_iter()
            .flatten()
            .find_map(value_to_string)
            .map(|t| Team::parse(&t)),
        position: payload.position.map(Position::from),
        round: [wire.round, payload.round, payload.round_no]
            .into_iter()
            .flatten()
            .find_map(value_to_round),
    };
    event.validate()?;
    Ok(event)
}

/// Parses a bulk match log: either a JSON array of events or one JSON object
/// per line. Individual bad entries are collected, not fatal.
pub fn parse_batch(text: &str) -> Result<ParsedBatch, ParseError> {
    let mut batch = ParsedBatch::default();
    let trimmed = text.trim_start();

    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        for value in values {
            batch.push(event_from_value(value));
        }
    } else {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            batch.push(parse_event(line));
        }
    }

    Ok(batch)
}

impl ParsedBatch {
    fn push(&mut self, parsed: Result<Event, ParseError>) {
        match parsed {
            Ok(event) => self.events.push(event),
            Err(err) => {
                warn!("Dropping malformed event: {}", err);
                self.malformed.push(err);
            }
        }
    }
}

/// Encodes an event in the inbound wire shape, so it parses back to the same
/// event (wall-clock timestamps come back as relative `time` seconds).
pub fn to_wire(event: &Event) -> Value {
    let mut wire = json!({
        "type": event.kind.as_str(),
        "time": event.timestamp,
        "event_id": event.id.as_str(),
    });
    let mut payload = Map::new();

    if let Some(actor) = &event.actor {
        wire["actor"] = json!(actor.as_str());
    }
    if let Some(target) = &event.target {
        wire["target"] = json!(target.as_str());
    }
    if let Some(team) = &event.team {
        wire["team"] = json!(team.to_string());
    }
    if let Some(position) = event.position {
        payload.insert("position".to_string(), json!(position.to_array()));
    }
    if let Some(round) = event.round {
        payload.insert("round".to_string(), json!(round));
    }
    if !payload.is_empty() {
        wire["payload"] = Value::Object(payload);
    }
    wire
}

fn wall_clock_seconds(value: &Value) -> Result<f64, ParseError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(ParseError::NonFiniteTime),
        Value::String(s) => parse_iso8601(s),
        other => Err(ParseError::BadTimestamp(other.to_string())),
    }
}

fn parse_iso8601(raw: &str) -> Result<f64, ParseError> {
    let seconds = |secs: i64, nanos: u32| secs as f64 + nanos as f64 / 1_000_000_000.0;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(seconds(dt.timestamp(), dt.timestamp_subsec_nanos()));
    }

    // No offset: read as UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| {
            let utc = naive.and_utc();
            seconds(utc.timestamp(), utc.timestamp_subsec_nanos())
        })
        .map_err(|_| ParseError::BadTimestamp(raw.to_string()))
}

// Round numbers are informational; anything that is not a small
// non-negative integer is ignored rather than rejecting the event
fn value_to_round(value: Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|r| u32::try_from(r).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

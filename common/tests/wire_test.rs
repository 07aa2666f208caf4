use anyhow::Result;
use common::{EntityId, EventKind, ParseError, Position, Team, parse_batch, parse_event};

#[test]
fn test_parse_relative_time_event() -> Result<()> {
    let event = parse_event(
        r#"{"type": "Move", "time": 1.25, "actor": "p1", "payload": {"position": [1, 2.5, -3]}}"#,
    )?;

    assert_eq!(event.kind, EventKind::Move);
    assert_eq!(event.timestamp, 1.25);
    assert_eq!(event.actor, Some(EntityId::from("p1")));
    assert_eq!(event.position, Some(Position::new(1.0, 2.5, -3.0)));
    assert_eq!(event.id.as_str(), "Move@1.25");
    Ok(())
}

#[test]
fn test_wall_clock_takes_precedence() -> Result<()> {
    let event = parse_event(
        r#"{"event_type": "ROUND_START", "timestamp": "2024-05-01T12:00:00.5Z", "time": 3}"#,
    )?;
    assert_eq!(event.kind, EventKind::RoundStart);
    assert_eq!(event.timestamp, 1_714_564_800.5);

    // Offsets are honored, missing offsets read as UTC
    let offset = parse_event(r#"{"type": "RoundEnd", "timestamp": "2024-05-01T14:00:00+02:00"}"#)?;
    let naive = parse_event(r#"{"type": "RoundEnd", "timestamp": "2024-05-01T12:00:00"}"#)?;
    assert_eq!(offset.timestamp, 1_714_564_800.0);
    assert_eq!(naive.timestamp, offset.timestamp);
    Ok(())
}

#[test]
fn test_supplied_event_id_wins() -> Result<()> {
    let named = parse_event(r#"{"type": "Kill", "time": 4, "target": "p2", "event_id": "k-17"}"#)?;
    assert_eq!(named.id.as_str(), "k-17");

    let numeric = parse_event(r#"{"type": "Kill", "time": 4, "target": 9, "event_id": 17}"#)?;
    assert_eq!(numeric.id.as_str(), "17");
    assert_eq!(numeric.target, Some(EntityId::from("9")));
    Ok(())
}

#[test]
fn test_team_from_top_level_or_payload() -> Result<()> {
    let top = parse_event(
        r#"{"type": "Spawn", "time": 0, "actor": "p1", "team": "Attackers", "payload": {"position": [0, 0, 0], "team": "B"}}"#,
    )?;
    assert_eq!(top.team, Some(Team::A));

    let nested = parse_event(
        r#"{"type": "Spawn", "time": 0, "actor": "p1", "payload": {"position": [0, 0, 0], "team": "red", "round": 7}}"#,
    )?;
    assert_eq!(nested.team, Some(Team::B));
    assert_eq!(nested.round, Some(7));
    Ok(())
}

#[test]
fn test_unknown_type_is_accepted() -> Result<()> {
    let event = parse_event(r#"{"type": "spike_planted", "time": 30, "actor": "p4"}"#)?;
    assert_eq!(event.kind, EventKind::Other("spike_planted".to_string()));
    Ok(())
}

#[test]
fn test_loosely_typed_optional_fields_do_not_drop_the_event() -> Result<()> {
    let kill = parse_event(r#"{"type": "Kill", "time": 2, "target": "p1", "round": "3"}"#)?;
    assert_eq!(kill.kind, EventKind::Kill);
    assert_eq!(kill.round, Some(3));

    let numeric_team = parse_event(r#"{"type": "Kill", "time": 2, "target": "p1", "team": 1}"#)?;
    assert_eq!(numeric_team.team, Some(Team::Named("1".to_string())));

    // Unusable top-level values fall through to the payload, then to nothing
    let fallback = parse_event(
        r#"{"type": "Kill", "time": 2, "target": "p1", "team": {"side": "A"}, "round": -1,
            "payload": {"team": "blue", "round_no": "x"}}"#,
    )?;
    assert_eq!(fallback.team, Some(Team::A));
    assert_eq!(fallback.round, None);
    assert_eq!(fallback.target, Some(EntityId::from("p1")));
    Ok(())
}

#[test]
fn test_malformed_events_are_rejected() {
    let cases = [
        (r#"not json"#, "json"),
        (r#"{"time": 1}"#, "kind"),
        (r#"{"type": "Move", "actor": "p1"}"#, "time"),
        (r#"{"type": "Kill", "time": 1}"#, "field"),
        (r#"{"type": "Spawn", "time": 1, "payload": {"position": [0, 0, 0]}}"#, "field"),
        (r#"{"type": "Move", "time": 1, "actor": "p1", "payload": {"position": [0, 0]}}"#, "json"),
        (r#"{"type": "RoundStart", "timestamp": "yesterday"}"#, "timestamp"),
    ];

    for (raw, expected) in cases {
        let err = parse_event(raw).expect_err(raw);
        let matched = match err {
            ParseError::Json(_) => expected == "json",
            ParseError::MissingKind => expected == "kind",
            ParseError::MissingTime => expected == "time",
            ParseError::MissingField { .. } => expected == "field",
            ParseError::BadTimestamp(_) => expected == "timestamp",
            ParseError::NonFiniteTime => false,
        };
        assert!(matched, "{raw} should fail with {expected}");
    }
}

#[test]
fn test_batch_formats() -> Result<()> {
    let array = parse_batch(
        r#"[
            {"type": "RoundStart", "time": 0},
            {"type": "Kill", "time": 1},
            {"type": "RoundEnd", "time": 2}
        ]"#,
    )?;
    assert_eq!(array.events.len(), 2);
    assert_eq!(array.malformed.len(), 1);

    let lines = parse_batch(
        "{\"type\": \"RoundStart\", \"time\": 0}\n\n{broken\n{\"type\": \"RoundEnd\", \"time\": 2}\n",
    )?;
    assert_eq!(lines.events.len(), 2);
    assert_eq!(lines.malformed.len(), 1);

    assert!(parse_batch("[{\"type\": ").is_err());
    Ok(())
}

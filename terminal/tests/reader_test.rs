use anyhow::Result;
use common::EventKind;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use terminal::replay::reader::{is_match_log, ReplayReader};

const MATCH_JSONL: &str = r#"{"type": "RoundStart", "time": 0, "round": 1}
{"type": "Spawn", "time": 0.5, "actor": "p1", "team": "A", "payload": {"position": [-20, 0, 0]}}
{"type": "Kill", "time": 3}
{"type": "RoundEnd", "time": 9}
"#;

fn scratch_dir(name: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("replay-reader-{}-{}", name, std::process::id()));
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn write_file(path: &Path, contents: &str, age_secs: u64) -> Result<()> {
    fs::write(path, contents)?;
    let modified = SystemTime::now() - Duration::from_secs(age_secs);
    File::options().write(true).open(path)?.set_modified(modified)?;
    Ok(())
}

#[test]
fn test_load_jsonl_skips_malformed_entries() -> Result<()> {
    let dir = scratch_dir("jsonl")?;
    let path = dir.join("final.jsonl");
    write_file(&path, MATCH_JSONL, 0)?;

    let replay = ReplayReader::load_replay(&path)?;
    assert_eq!(replay.name, "final.jsonl");
    assert_eq!(replay.events.len(), 3);
    assert_eq!(replay.malformed, 1);
    assert_eq!(replay.events[0].kind, EventKind::RoundStart);

    fs::remove_dir_all(dir)?;
    Ok(())
}

#[test]
fn test_load_json_array_and_gzip() -> Result<()> {
    let dir = scratch_dir("gzip")?;

    let array = r#"[{"type": "RoundStart", "time": 0}, {"type": "RoundEnd", "time": 4}]"#;
    let plain = dir.join("match.json");
    write_file(&plain, array, 0)?;

    let packed = dir.join("match.jsonl.gz");
    let mut encoder = GzEncoder::new(File::create(&packed)?, Compression::default());
    encoder.write_all(MATCH_JSONL.as_bytes())?;
    encoder.finish()?;

    assert_eq!(ReplayReader::load_replay(&plain)?.events.len(), 2);
    let unpacked = ReplayReader::load_replay(&packed)?;
    assert_eq!(unpacked.events.len(), 3);
    assert_eq!(unpacked.malformed, 1);

    fs::remove_dir_all(dir)?;
    Ok(())
}

#[test]
fn test_unreadable_log_is_an_error() -> Result<()> {
    let dir = scratch_dir("broken")?;
    let truncated = dir.join("truncated.json");
    write_file(&truncated, "[{\"type\": ", 0)?;

    assert!(ReplayReader::load_replay(&truncated).is_err());
    assert!(ReplayReader::load_replay(&dir.join("missing.json")).is_err());

    fs::remove_dir_all(dir)?;
    Ok(())
}

#[test]
fn test_list_replays_newest_first() -> Result<()> {
    let dir = scratch_dir("list")?;
    fs::create_dir_all(dir.join("day2"))?;

    write_file(&dir.join("old.json"), "[]", 3000)?;
    write_file(&dir.join("day2").join("new.jsonl"), "", 10)?;
    write_file(&dir.join("middle.jsonl"), "", 600)?;
    write_file(&dir.join("notes.txt"), "not a log", 0)?;

    let listed = ReplayReader::list_replays(&dir)?;
    let names: Vec<_> = listed
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, vec!["new.jsonl", "middle.jsonl", "old.json"]);

    assert!(ReplayReader::list_replays(&dir.join("absent"))?.is_empty());

    fs::remove_dir_all(dir)?;
    Ok(())
}

#[test]
fn test_match_log_extensions() {
    assert!(is_match_log(Path::new("a.json")));
    assert!(is_match_log(Path::new("a.JSONL")));
    assert!(is_match_log(Path::new("a.json.gz")));
    assert!(!is_match_log(Path::new("a.gz")));
    assert!(!is_match_log(Path::new("a.replay")));
    assert!(!is_match_log(Path::new("json")));
}

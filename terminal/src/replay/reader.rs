use super::*;
use anyhow::{Context, Result};
use common::parse_batch;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};

const LOG_EXTENSIONS: [&str; 2] = ["json", "jsonl"];

pub struct ReplayReader;

impl ReplayReader {
    /// Reads a match log: a JSON array or one event per line, optionally
    /// gzip-compressed (`.gz`).
    pub fn load_replay(path: &Path) -> Result<ReplayData> {
        let file =
            File::open(path).with_context(|| format!("Failed to open match log: {:?}", path))?;

        let mut text = String::new();
        if is_gzip(path) {
            GzDecoder::new(file)
                .read_to_string(&mut text)
                .with_context(|| format!("Failed to decompress match log: {:?}", path))?;
        } else {
            let mut file = file;
            file.read_to_string(&mut text)
                .with_context(|| format!("Failed to read match log: {:?}", path))?;
        }

        let batch = parse_batch(&text)
            .with_context(|| format!("Failed to parse match log: {:?}", path))?;
        if !batch.malformed.is_empty() {
            warn!(
                "{} malformed entries skipped in {:?}",
                batch.malformed.len(),
                path
            );
        }
        debug!("Loaded {} events from {:?}", batch.events.len(), path);

        Ok(ReplayData {
            name: display_name(path),
            source: Some(path.to_path_buf()),
            events: batch.events,
            malformed: batch.malformed.len(),
        })
    }

    /// Match logs under `dir`, searched recursively, newest first.
    pub fn list_replays(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut replays = Vec::new();

        fn find_match_logs(dir: &Path, replays: &mut Vec<PathBuf>) -> Result<()> {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();

                if path.is_dir() {
                    find_match_logs(&path, replays).ok();
                } else if is_match_log(&path) {
                    replays.push(path);
                }
            }
            Ok(())
        }

        find_match_logs(dir, &mut replays)
            .with_context(|| format!("Failed to list match logs in {:?}", dir))?;

        replays.sort_by_key(|path| {
            std::cmp::Reverse(
                path.metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH),
            )
        });

        Ok(replays)
    }
}

/// `match.json`, `match.jsonl`, and either one with a trailing `.gz`.
pub fn is_match_log(path: &Path) -> bool {
    let inner = if is_gzip(path) {
        path.file_stem().map(Path::new)
    } else {
        Some(path)
    };

    inner
        .and_then(|p| p.extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| LOG_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("match log")
        .to_string()
}

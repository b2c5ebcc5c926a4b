//! Rebuilds the `.parquet_index.json`/`.parquet_bars_index.json` sidecars
//! (§6) by scanning the columnar store on disk. Safe to run at any time:
//! the result is idempotent modulo `created_at` (§8 round-trip property),
//! checked with [`TickIndex::eq_ignoring_timestamp`]/
//! [`BarIndex::eq_ignoring_timestamp`].

use crate::error::DataError;
use crate::index::{BarIndex, FileEntry, TickIndex};
use chrono::Utc;
use finiex_core::{Bar, Tick, Timeframe};
use std::path::Path;

fn io_error(path: &Path, source: std::io::Error) -> DataError {
    DataError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn parse_error(path: &Path, source: serde_json::Error) -> DataError {
    DataError::ConfigParse {
        path: path.display().to_string(),
        source,
    }
}

/// Scan `root/<SYMBOL>/*.json` tick files (§6 `SYMBOL_YYYYMMDD_HHMMSS.json`
/// under `ticks/<SYMBOL>/`) and rebuild a [`TickIndex`] covering every
/// symbol directory found.
pub fn rebuild_tick_index(root: &Path) -> Result<TickIndex, DataError> {
    let mut index = TickIndex::new(Utc::now());

    for symbol_dir in list_dirs(root)? {
        let symbol = symbol_dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        for path in list_json_files(&symbol_dir)? {
            let bytes = std::fs::read(&path).map_err(|source| io_error(&path, source))?;
            let ticks: Vec<Tick> = serde_json::from_slice(&bytes).map_err(|source| parse_error(&path, source))?;
            if ticks.is_empty() {
                continue;
            }

            let start_time = ticks.iter().map(|tick| tick.timestamp).min().expect("non-empty");
            let end_time = ticks.iter().map(|tick| tick.timestamp).max().expect("non-empty");

            index.insert(
                symbol.clone(),
                FileEntry {
                    path: path.display().to_string(),
                    start_time,
                    end_time,
                    row_count: ticks.len() as u64,
                },
            );
        }
    }

    for entries in index.files.values_mut() {
        entries.sort_by_key(|entry| entry.start_time);
    }

    Ok(index)
}

/// Scan `root/<SYMBOL>/*.json` bar files (§6 `SYMBOL_TF_BARS.json` under
/// `bars/<SYMBOL>/`) and rebuild a [`BarIndex`]. The timeframe is read from
/// the bars themselves rather than parsed out of the filename, since every
/// bar already carries its own `timeframe` field.
pub fn rebuild_bar_index(root: &Path) -> Result<BarIndex, DataError> {
    let mut index = BarIndex::new(Utc::now());

    for symbol_dir in list_dirs(root)? {
        let symbol = symbol_dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        for path in list_json_files(&symbol_dir)? {
            let bytes = std::fs::read(&path).map_err(|source| io_error(&path, source))?;
            let bars: Vec<Bar> = serde_json::from_slice(&bytes).map_err(|source| parse_error(&path, source))?;
            if bars.is_empty() {
                continue;
            }

            let timeframe = bars[0].timeframe;
            if bars.iter().any(|bar| bar.timeframe != timeframe) {
                return Err(DataError::Validation(format!(
                    "bar file {} mixes timeframes, expected only {}",
                    path.display(),
                    timeframe.name()
                )));
            }

            let start_time = bars.iter().map(|bar| bar.timestamp).min().expect("non-empty");
            let end_time = bars.iter().map(|bar| bar.timestamp).max().expect("non-empty");

            index.insert(
                symbol.clone(),
                timeframe,
                FileEntry {
                    path: path.display().to_string(),
                    start_time,
                    end_time,
                    row_count: bars.len() as u64,
                },
            );
        }
    }

    Ok(index)
}

/// Summary counters for `bar_index_cli status`/`report` (§6 CLI surface).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStatus {
    pub symbols: usize,
    pub files: usize,
    pub total_rows: u64,
}

pub fn tick_index_status(index: &TickIndex) -> IndexStatus {
    IndexStatus {
        symbols: index.files.len(),
        files: index.files.values().map(|entries| entries.len()).sum(),
        total_rows: index.files.values().flatten().map(|entry| entry.row_count).sum(),
    }
}

pub fn bar_index_status(index: &BarIndex) -> IndexStatus {
    IndexStatus {
        symbols: index.files.len(),
        files: index.files.values().map(|by_tf| by_tf.len()).sum(),
        total_rows: index.files.values().flatten().map(|(_, entry)| entry.row_count).sum(),
    }
}

fn list_dirs(root: &Path) -> Result<Vec<std::path::PathBuf>, DataError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|source| io_error(root, source))? {
        let entry = entry.map_err(|source| io_error(root, source))?;
        if entry.file_type().map_err(|source| io_error(root, source))?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn list_json_files(dir: &Path) -> Result<Vec<std::path::PathBuf>, DataError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|source| io_error(dir, source))? {
        let entry = entry.map_err(|source| io_error(dir, source))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

use chrono::{DateTime, Utc};
use finiex_core::Timeframe;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

/// One indexed file's coverage range (§4.2).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub row_count: u64,
}

impl FileEntry {
    fn overlaps(&self, t0: DateTime<Utc>, t1: DateTime<Utc>) -> bool {
        self.start_time <= t1 && self.end_time >= t0
    }
}

/// `symbol → sorted list of tick file entries`. Built by scanning the
/// columnar store once; persisted as the `.parquet_index.json` sidecar
/// (§6), safe to regenerate.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TickIndex {
    pub created_at: DateTime<Utc>,
    pub files: HashMap<SmolStr, Vec<FileEntry>>,
}

impl TickIndex {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            files: HashMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: impl Into<SmolStr>, entry: FileEntry) {
        self.files.entry(symbol.into()).or_default().push(entry);
    }

    /// Every file for `symbol` whose `[start, end]` overlaps `[t0, t1]`
    /// (§4.2), in file order.
    pub fn files_for_range(&self, symbol: &str, t0: DateTime<Utc>, t1: DateTime<Utc>) -> Vec<&FileEntry> {
        self.files
            .get(symbol)
            .into_iter()
            .flatten()
            .filter(|entry| entry.overlaps(t0, t1))
            .collect()
    }

    /// Equality that ignores `created_at`, the only field the rebuild
    /// contract (§8 round-trip property) allows to differ between two
    /// builds of an otherwise-unchanged store.
    pub fn eq_ignoring_timestamp(&self, other: &Self) -> bool {
        self.files == other.files
    }
}

/// `symbol → timeframe → single bar file entry`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BarIndex {
    pub created_at: DateTime<Utc>,
    pub files: HashMap<SmolStr, HashMap<Timeframe, FileEntry>>,
}

impl BarIndex {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            files: HashMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: impl Into<SmolStr>, timeframe: Timeframe, entry: FileEntry) {
        self.files.entry(symbol.into()).or_default().insert(timeframe, entry);
    }

    pub fn bar_file(&self, symbol: &str, timeframe: Timeframe) -> Option<&FileEntry> {
        self.files.get(symbol).and_then(|by_tf| by_tf.get(&timeframe))
    }

    pub fn eq_ignoring_timestamp(&self, other: &Self) -> bool {
        self.files == other.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(start: i64, end: i64) -> FileEntry {
        FileEntry {
            path: format!("{start}.json"),
            start_time: Utc.timestamp_opt(start, 0).unwrap(),
            end_time: Utc.timestamp_opt(end, 0).unwrap(),
            row_count: 100,
        }
    }

    #[test]
    fn test_files_for_range_overlap() {
        let mut index = TickIndex::new(Utc::now());
        index.insert("EURUSD", entry(0, 100));
        index.insert("EURUSD", entry(100, 200));
        index.insert("EURUSD", entry(300, 400));

        let matched = index.files_for_range("EURUSD", Utc.timestamp_opt(150, 0).unwrap(), Utc.timestamp_opt(350, 0).unwrap());
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_files_for_range_unknown_symbol() {
        let index = TickIndex::new(Utc::now());
        assert!(index.files_for_range("GBPUSD", Utc::now(), Utc::now()).is_empty());
    }

    #[test]
    fn test_eq_ignoring_timestamp() {
        let mut a = TickIndex::new(Utc.timestamp_opt(0, 0).unwrap());
        let mut b = TickIndex::new(Utc.timestamp_opt(99, 0).unwrap());
        a.insert("EURUSD", entry(0, 100));
        b.insert("EURUSD", entry(0, 100));
        assert!(a.eq_ignoring_timestamp(&b));
    }
}

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Static registry of supported bar intervals, sorted ascending by
/// duration. Mirrors the teacher's `TimeInterval` family in
/// `statistic::time`, but as a closed enum rather than one struct per
/// interval, since the set of timeframes here is fixed by the data store
/// contract (§3) rather than open for ad hoc extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// All timeframes, ascending.
    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// Pandas-style resample rule string, kept only for parity with the
    /// consumed bar store metadata (§6); never interpreted by this crate.
    pub fn resample_rule(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1min",
            Timeframe::M5 => "5min",
            Timeframe::M15 => "15min",
            Timeframe::M30 => "30min",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1D",
        }
    }

    /// Ascending sort index, stable across registry changes.
    pub fn sort_index(&self) -> u8 {
        Timeframe::ALL
            .iter()
            .position(|tf| tf == self)
            .expect("Timeframe::ALL is exhaustive") as u8
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Timeframe::ALL.into_iter().find(|tf| tf.name() == name)
    }

    /// Floor `t` to this timeframe's bar-open boundary on the UTC wall
    /// clock. Stable under DST because all inputs and outputs are UTC.
    ///
    /// Daily bars align on the UTC midnight boundary; everything below
    /// D1 aligns on `floor(minute_of_day, minutes(tf))`.
    pub fn align_bar_open(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        if let Some(cached) = lookup_cache(*self, t) {
            return cached;
        }

        let minutes = self.minutes();
        let aligned = if minutes >= 1440 {
            Utc.with_ymd_and_hms(t.year(), t.month(), t.day(), 0, 0, 0)
                .single()
                .expect("valid calendar date")
        } else {
            let minute_of_day = t.hour() as i64 * 60 + t.minute() as i64;
            let floored = (minute_of_day / minutes) * minutes;
            let hour = floored / 60;
            let minute = floored % 60;
            Utc.with_ymd_and_hms(t.year(), t.month(), t.day(), hour as u32, minute as u32, 0)
                .single()
                .expect("valid calendar date")
        };

        store_cache(*self, t, aligned);
        aligned
    }

    /// A bar opened at `bar_open` is complete once `now`'s own bar-open
    /// boundary has advanced past it.
    pub fn is_bar_complete(&self, bar_open: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.align_bar_open(now) > bar_open
    }
}

/// `align_bar_open` result cache, keyed by `(year, month, day, hour,
/// floor(minute/m)*m, tf)` per §4.1. A tick stream re-visits the same
/// minute bucket many times (every tick within a bar), so this avoids
/// recomputing the same floor/calendar arithmetic per tick.
struct AlignCache {
    entries: parking_lot_like::Mutex<std::collections::HashMap<(Timeframe, i64), DateTime<Utc>>>,
}

// A tiny re-implementation avoiding a hard dependency from this leaf crate
// on `parking_lot`; `std::sync::Mutex` is sufficient here since the lock
// is held only for a hashmap lookup/insert, never across an await point.
mod parking_lot_like {
    pub use std::sync::Mutex;
}

fn cache() -> &'static AlignCache {
    static CACHE: OnceLock<AlignCache> = OnceLock::new();
    CACHE.get_or_init(|| AlignCache {
        entries: parking_lot_like::Mutex::new(std::collections::HashMap::new()),
    })
}

fn cache_key(t: DateTime<Utc>) -> i64 {
    // Minute resolution is sufficient: align_bar_open only ever depends on
    // the minute component of `t`.
    t.timestamp() / 60
}

fn lookup_cache(tf: Timeframe, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    cache().entries.lock().unwrap().get(&(tf, cache_key(t))).copied()
}

fn store_cache(tf: Timeframe, t: DateTime<Utc>, aligned: DateTime<Utc>) {
    cache()
        .entries
        .lock()
        .unwrap()
        .insert((tf, cache_key(t)), aligned);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_all_sorted_ascending_by_minutes() {
        let minutes: Vec<i64> = Timeframe::ALL.iter().map(|tf| tf.minutes()).collect();
        let mut sorted = minutes.clone();
        sorted.sort();
        assert_eq!(minutes, sorted);
    }

    #[test]
    fn test_align_bar_open_m5() {
        struct TestCase {
            input: DateTime<Utc>,
            expected: DateTime<Utc>,
        }

        let cases = vec![
            TestCase {
                input: Utc.with_ymd_and_hms(2024, 1, 1, 10, 3, 30).unwrap(),
                expected: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            },
            TestCase {
                input: Utc.with_ymd_and_hms(2024, 1, 1, 10, 7, 0).unwrap(),
                expected: Utc.with_ymd_and_hms(2024, 1, 1, 10, 5, 0).unwrap(),
            },
            TestCase {
                input: Utc.with_ymd_and_hms(2024, 1, 1, 10, 59, 59).unwrap(),
                expected: Utc.with_ymd_and_hms(2024, 1, 1, 10, 55, 0).unwrap(),
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            assert_eq!(
                Timeframe::M5.align_bar_open(test.input),
                test.expected,
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_align_bar_open_d1() {
        let t = Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(Timeframe::D1.align_bar_open(t), expected);
    }

    #[test]
    fn test_is_bar_complete() {
        let bar_open = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let still_open = Utc.with_ymd_and_hms(2024, 1, 1, 10, 4, 59).unwrap();
        let completed = Utc.with_ymd_and_hms(2024, 1, 1, 10, 5, 0).unwrap();

        assert!(!Timeframe::M5.is_bar_complete(bar_open, still_open));
        assert!(Timeframe::M5.is_bar_complete(bar_open, completed));
    }

    #[test]
    fn test_from_name_round_trip() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from_name(tf.name()), Some(tf));
        }
        assert_eq!(Timeframe::from_name("W1"), None);
    }
}

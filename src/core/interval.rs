//! A small interval index used by chronology checking.
//!
//! No interval-tree crate appears anywhere in the example pack, so this
//! is hand-rolled rather than an invented dependency: a flat `Vec` of
//! half-open `[start, stop)` spans, linear-scanned for the first
//! overlap. Forests are expected to hold at most a few dozen intervals
//! per project, so this is adequate without balancing.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct Entry {
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    source: PathBuf,
}

/// A flat index of half-open `[start, stop)` intervals, queryable for
/// the first overlapping entry.
#[derive(Debug, Default)]
pub struct IntervalTree {
    entries: Vec<Entry>,
}

impl IntervalTree {
    pub fn new() -> Self {
        IntervalTree::default()
    }

    /// The first previously-inserted interval overlapping `[start, stop)`.
    pub fn query_overlap(
        &self,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>, &Path)> {
        if start == stop {
            return None;
        }
        self.entries
            .iter()
            .find(|e| start < e.stop && e.start < stop)
            .map(|e| (e.start, e.stop, e.source.as_path()))
    }

    pub fn insert(&mut self, start: DateTime<Utc>, stop: DateTime<Utc>, source: PathBuf) {
        self.entries.push(Entry { start, stop, source });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn disjoint_intervals_do_not_overlap() {
        let mut tree = IntervalTree::new();
        tree.insert(at(0), at(2), PathBuf::from("a"));
        assert!(tree.query_overlap(at(2), at(4)).is_none());
    }

    #[test]
    fn overlapping_intervals_are_detected() {
        let mut tree = IntervalTree::new();
        tree.insert(at(0), at(4), PathBuf::from("a"));
        let hit = tree.query_overlap(at(2), at(6));
        assert!(hit.is_some());
    }

    #[test]
    fn zero_length_interval_never_overlaps() {
        let mut tree = IntervalTree::new();
        tree.insert(at(0), at(4), PathBuf::from("a"));
        assert!(tree.query_overlap(at(2), at(2)).is_none());
    }
}

//! Chunk-local aggregation.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::config::{EngineConfig, MalformedPolicy};
use crate::error::Result;
use crate::planner::ByteRange;
use crate::scanner::{Record, RecordScanner};
use crate::stats::Stats;

/// Key → [`Stats`] for one chunk or for the whole input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateMap {
    entries: HashMap<Box<[u8]>, Stats>,
    skipped: u64,
}

impl AggregateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one value into `key`. The key is hashed once and copied only on
    /// first sight.
    #[inline]
    pub fn observe(&mut self, key: &[u8], value: i64) {
        self.entries
            .entry_ref(key)
            .and_modify(|stats| stats.observe(value))
            .or_insert_with(|| Stats::new(value));
    }

    pub fn get(&self, key: &[u8]) -> Option<&Stats> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Malformed lines dropped under [`MalformedPolicy::Skip`].
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Stats)> {
        self.entries.iter().map(|(key, stats)| (&**key, stats))
    }

    /// Combines `other` into `self` key by key.
    pub fn merge_from(&mut self, other: AggregateMap) {
        self.entries.reserve(other.entries.len());
        for (key, stats) in other.entries {
            match self.entries.entry(key) {
                Entry::Occupied(mut slot) => slot.get_mut().merge(&stats),
                Entry::Vacant(slot) => {
                    slot.insert(stats);
                }
            }
        }
        self.skipped += other.skipped;
    }

    /// Merges two maps, iterating the smaller one.
    pub fn merge(mut self, mut other: AggregateMap) -> AggregateMap {
        if self.len() < other.len() {
            std::mem::swap(&mut self, &mut other);
        }
        self.merge_from(other);
        self
    }

    /// Entries sorted by key bytes.
    pub fn into_sorted(self) -> Vec<(Box<[u8]>, Stats)> {
        let mut entries: Vec<_> = self.entries.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Strict fold over a record sequence; stops at the first error.
pub fn aggregate<'a, I>(records: I) -> Result<AggregateMap>
where
    I: IntoIterator<Item = Result<Record<'a>>>,
{
    let mut map = AggregateMap::new();
    for record in records {
        let record = record?;
        map.observe(record.key, record.value);
    }
    Ok(map)
}

/// Scans and aggregates one planned range.
pub fn aggregate_chunk(input: &[u8], range: ByteRange, config: &EngineConfig) -> Result<AggregateMap> {
    let mut scanner = RecordScanner::new(input, range, config.delimiter, config.terminator);

    let map = match config.on_malformed {
        MalformedPolicy::Fail => aggregate(&mut scanner)?,
        MalformedPolicy::Skip => {
            let mut map = AggregateMap::new();
            loop {
                for record in &mut scanner {
                    match record {
                        Ok(record) => map.observe(record.key, record.value),
                        Err(err) => {
                            debug!("Skipping line: {}", err);
                            map.skipped += 1;
                        }
                    }
                }
                if scanner.position() >= range.end.min(input.len()) {
                    break;
                }
                scanner.resume();
            }
            if map.skipped > 0 {
                warn!(
                    start = range.start,
                    end = range.end,
                    skipped = map.skipped,
                    "Dropped malformed lines"
                );
            }
            map
        }
    };

    debug!(
        start = range.start,
        end = range.end,
        keys = map.len(),
        "Chunk aggregated"
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn whole(input: &[u8]) -> ByteRange {
        ByteRange::new(0, input.len())
    }

    #[test]
    fn test_aggregates_example_input() {
        let input = b"A;10.0\nB;5.0\nA;20.0\n";
        let map = aggregate_chunk(input, whole(input), &EngineConfig::default()).unwrap();
        assert_eq!(map.len(), 2);

        let a = map.get(b"A").unwrap();
        assert_eq!((a.min(), a.max(), a.count()), (10_000_000, 20_000_000, 2));
        assert_eq!(a.sum(), 30_000_000);

        let b = map.get(b"B").unwrap();
        assert_eq!((b.min(), b.max(), b.count()), (5_000_000, 5_000_000, 1));
        assert_eq!(map.skipped(), 0);
    }

    #[test]
    fn test_empty_range_is_empty_map() {
        let map = aggregate_chunk(b"", ByteRange::new(0, 0), &EngineConfig::default()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_strict_mode_fails_on_malformed_line() {
        let input = b"A;1.0\nC;notanumber\n";
        let err = aggregate_chunk(input, whole(input), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { offset: 6, .. }));
    }

    #[test]
    fn test_skip_mode_counts_dropped_lines() {
        let input = b"A;1.0\nbad\nA;3.0\n;2.0\nB;x\nB;4.0";
        let config = EngineConfig::default().with_malformed_policy(MalformedPolicy::Skip);
        let map = aggregate_chunk(input, whole(input), &config).unwrap();
        assert_eq!(map.skipped(), 3);
        assert_eq!(map.get(b"A").unwrap().count(), 2);
        assert_eq!(map.get(b"B").unwrap().count(), 1);
    }

    #[test]
    fn test_skip_mode_with_malformed_last_line() {
        let input = b"A;1.0\nA;oops";
        let config = EngineConfig::default().with_malformed_policy(MalformedPolicy::Skip);
        let map = aggregate_chunk(input, whole(input), &config).unwrap();
        assert_eq!(map.skipped(), 1);
        assert_eq!(map.get(b"A").unwrap().count(), 1);
    }

    #[test]
    fn test_merge_combines_overlapping_keys() {
        let mut left = AggregateMap::new();
        left.observe(b"A", 1);
        left.observe(b"B", 2);
        let mut right = AggregateMap::new();
        right.observe(b"A", 5);
        right.skipped = 2;

        let merged = right.merge(left);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get(b"A").unwrap().count(), 2);
        assert_eq!(merged.get(b"A").unwrap().max(), 5);
        assert_eq!(merged.skipped(), 2);
    }

    #[test]
    fn test_into_sorted_orders_by_bytes() {
        let mut map = AggregateMap::new();
        for key in [&b"b"[..], &b"B"[..], &b"a"[..], &b"\xc3\x84"[..]] {
            map.observe(key, 0);
        }
        let keys: Vec<_> = map.into_sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                Box::from(&b"B"[..]),
                Box::from(&b"a"[..]),
                Box::from(&b"b"[..]),
                Box::from(&b"\xc3\x84"[..]),
            ]
        );
    }
}

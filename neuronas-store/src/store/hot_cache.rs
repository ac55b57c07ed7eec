//! In-memory TTL cache mirroring recent L1 inserts.
//!
//! Entries are held in insertion order and pruned lazily: every insert and
//! every read first drops entries older than the TTL. Nothing expires in the
//! background.

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::tier::Table;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct CacheEntry {
    inserted_at: DateTime<Utc>,
    table: Table,
    record: Value,
}

/// TTL cache of uncompressed records.
pub struct HotCache {
    entries: Mutex<VecDeque<CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl HotCache {
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|e| Error::Internal(format!("Failed to lock hot cache: {}", e)))
    }

    /// Drop expired entries. Returns how many were removed.
    fn prune(&self, entries: &mut VecDeque<CacheEntry>, now: DateTime<Utc>) -> usize {
        let before = entries.len();
        // Insertion order is timestamp order unless the clock stepped back
        entries.retain(|e| now - e.inserted_at <= self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned expired hot cache entries");
        }
        removed
    }

    /// Prune, then cache a record under the current timestamp.
    pub fn insert(&self, table: Table, record: Value) -> Result<()> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        self.prune(&mut entries, now);
        entries.push_back(CacheEntry {
            inserted_at: now,
            table,
            record,
        });
        Ok(())
    }

    /// Prune, then return the live records for a table in insertion order.
    pub fn snapshot(&self, table: Table) -> Result<Vec<Value>> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        self.prune(&mut entries, now);
        Ok(entries
            .iter()
            .filter(|e| e.table == table)
            .map(|e| e.record.clone())
            .collect())
    }

    /// Prune, then count live entries across all tables.
    pub fn len(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        self.prune(&mut entries, now);
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn cache_with_clock() -> (HotCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = HotCache::new(std::time::Duration::from_secs(60), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_insert_and_snapshot() {
        let (cache, _clock) = cache_with_clock();
        cache.insert(Table::Memory, json!("a")).unwrap();
        cache.insert(Table::Memory, json!("b")).unwrap();
        cache.insert(Table::Metrics, json!(1)).unwrap();

        assert_eq!(
            cache.snapshot(Table::Memory).unwrap(),
            vec![json!("a"), json!("b")]
        );
        assert_eq!(cache.snapshot(Table::Metrics).unwrap(), vec![json!(1)]);
        assert!(cache.snapshot(Table::Settings).unwrap().is_empty());
        assert_eq!(cache.len().unwrap(), 3);
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.insert(Table::Memory, json!("old")).unwrap();

        clock.advance(Duration::seconds(30));
        cache.insert(Table::Memory, json!("new")).unwrap();

        // Exactly at the TTL the first entry is still live
        clock.advance(Duration::seconds(30));
        assert_eq!(cache.snapshot(Table::Memory).unwrap().len(), 2);

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.snapshot(Table::Memory).unwrap(), vec![json!("new")]);

        clock.advance(Duration::seconds(30));
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_insert_prunes_before_writing() {
        let (cache, clock) = cache_with_clock();
        cache.insert(Table::Knowledge, json!(1)).unwrap();
        clock.advance(Duration::seconds(120));
        cache.insert(Table::Knowledge, json!(2)).unwrap();

        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let (cache, _clock) = cache_with_clock();
        cache.insert(Table::Memory, json!({"k": "v"})).unwrap();
        let first = cache.snapshot(Table::Memory).unwrap();
        let second = cache.snapshot(Table::Memory).unwrap();
        assert_eq!(first, second);
    }
}

//! Tiered store facade.

use crate::clock::{Clock, SystemClock};
use crate::codec::Compression;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::gate::{GateDecision, ImportanceGate, DEFAULT_IMPORTANCE};
use crate::store::hot_cache::HotCache;
use crate::store::tier_store::TierStore;
use crate::tier::{Table, Tier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Database file per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPaths {
    #[serde(rename = "L1")]
    pub l1: PathBuf,
    #[serde(rename = "L2")]
    pub l2: PathBuf,
    #[serde(rename = "L3")]
    pub l3: PathBuf,
}

impl TierPaths {
    pub fn new(l1: impl Into<PathBuf>, l2: impl Into<PathBuf>, l3: impl Into<PathBuf>) -> Self {
        Self {
            l1: l1.into(),
            l2: l2.into(),
            l3: l3.into(),
        }
    }

    /// `l1.db`, `l2.db` and `l3.db` inside a directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("l1.db"), dir.join("l2.db"), dir.join("l3.db"))
    }

    pub fn get(&self, tier: Tier) -> &Path {
        match tier {
            Tier::L1 => &self.l1,
            Tier::L2 => &self.l2,
            Tier::L3 => &self.l3,
        }
    }
}

/// Result of a successful insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertReceipt {
    pub tier: Tier,
    pub table: Table,
    /// Row id in the tier database
    pub row_id: i64,
    /// Whether the importance gate flagged this insert
    pub below_threshold: bool,
    /// Whether the record was mirrored into the hot cache
    pub cached: bool,
}

/// Records returned by [`TieredStore::retrieve_all`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieval {
    /// Decoded persisted rows, then live hot-cache entries (L1 only)
    pub records: Vec<Value>,
    /// Persisted rows that could not be decoded
    pub skipped: usize,
    /// How many of `records` came from the hot cache
    pub from_cache: usize,
}

impl Retrieval {
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Value> {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if any persisted row failed to decode.
    pub fn has_skipped(&self) -> bool {
        self.skipped > 0
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Row counts per tier and table
    pub rows: BTreeMap<Tier, BTreeMap<Table, u64>>,
    /// Codec per tier
    pub codecs: BTreeMap<Tier, Compression>,
    /// Live hot-cache entries after pruning
    pub hot_cache_entries: usize,
    /// Below-threshold L3 inserts since open
    pub importance_breaches: u64,
}

impl StoreStats {
    pub fn total_rows(&self, tier: Tier) -> u64 {
        self.rows
            .get(&tier)
            .map(|tables| tables.values().sum())
            .unwrap_or(0)
    }
}

/// Three-tier key-value store.
///
/// Each tier has its own SQLite database and codec. L1 inserts are also kept
/// uncompressed in a TTL cache; L3 inserts pass through the importance gate.
///
/// ```rust,ignore
/// use neuronas_store::{StoreConfig, TierPaths, TieredStore, Tier};
/// use serde_json::json;
///
/// let config = StoreConfig::load("config.json")?;
/// let store = TieredStore::open(config, TierPaths::in_dir("data"))?;
///
/// store.insert(Tier::L2, "metrics", &json!({"score": 0.42}), 0.9)?;
/// let metrics = store.retrieve_all(Tier::L2, "metrics")?;
///
/// store.close()?;
/// ```
pub struct TieredStore {
    config: StoreConfig,
    tiers: [TierStore; 3],
    cache: HotCache,
    gate: ImportanceGate,
}

impl TieredStore {
    /// Open the three tier databases.
    pub fn open(config: StoreConfig, paths: TierPaths) -> Result<Self> {
        Self::open_with_clock(config, paths, Arc::new(SystemClock))
    }

    /// Open with an explicit clock for the hot cache.
    pub fn open_with_clock(
        config: StoreConfig,
        paths: TierPaths,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let tiers = [
            TierStore::open(Tier::L1, config.compression_for(Tier::L1), paths.get(Tier::L1))?,
            TierStore::open(Tier::L2, config.compression_for(Tier::L2), paths.get(Tier::L2))?,
            TierStore::open(Tier::L3, config.compression_for(Tier::L3), paths.get(Tier::L3))?,
        ];
        Ok(Self::assemble(config, tiers, clock))
    }

    /// Create a store backed by in-memory databases with all tables (for testing).
    pub fn in_memory(config: StoreConfig) -> Result<Self> {
        Self::in_memory_with_clock(config, Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let tiers = [
            TierStore::in_memory(Tier::L1, config.compression_for(Tier::L1))?,
            TierStore::in_memory(Tier::L2, config.compression_for(Tier::L2))?,
            TierStore::in_memory(Tier::L3, config.compression_for(Tier::L3))?,
        ];
        Ok(Self::assemble(config, tiers, clock))
    }

    fn assemble(config: StoreConfig, tiers: [TierStore; 3], clock: Arc<dyn Clock>) -> Self {
        let cache = HotCache::new(config.cache_ttl(), clock);
        let gate = ImportanceGate::new(config.min_importance());
        tracing::info!(
            l1 = %tiers[0].codec(),
            l2 = %tiers[1].codec(),
            l3 = %tiers[2].codec(),
            min_importance = gate.min_threshold(),
            "tiered store ready"
        );
        Self {
            config,
            tiers,
            cache,
            gate,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn tier(&self, tier: Tier) -> &TierStore {
        match tier {
            Tier::L1 => &self.tiers[0],
            Tier::L2 => &self.tiers[1],
            Tier::L3 => &self.tiers[2],
        }
    }

    /// Create missing whitelisted tables in every tier database.
    pub fn initialize_schema(&self) -> Result<()> {
        for store in &self.tiers {
            store.initialize_schema()?;
        }
        Ok(())
    }

    /// Store a record in a tier.
    ///
    /// The table is checked against the whitelist and the importance score is
    /// validated before any I/O. A failed write is rolled back and returned.
    pub fn insert<T>(&self, tier: Tier, table: &str, data: &T, importance: f64) -> Result<InsertReceipt>
    where
        T: Serialize + ?Sized,
    {
        let table: Table = table.parse()?;
        ImportanceGate::validate(importance)?;
        let record = serde_json::to_value(data)?;

        let row_id = self
            .tier(tier)
            .append_record(table, &record)
            .map_err(|e| {
                tracing::error!(%tier, %table, error = %e, "insert failed");
                e
            })?;

        let decision = self.gate.evaluate(tier, table, importance);

        let cached = tier.is_cached();
        if cached {
            self.cache.insert(table, record)?;
        }

        tracing::debug!(%tier, %table, row_id, importance, cached, "inserted record");
        Ok(InsertReceipt {
            tier,
            table,
            row_id,
            below_threshold: decision == GateDecision::BelowThreshold,
            cached,
        })
    }

    /// Store a record with the default importance of 1.0.
    pub fn insert_default<T>(&self, tier: Tier, table: &str, data: &T) -> Result<InsertReceipt>
    where
        T: Serialize + ?Sized,
    {
        self.insert(tier, table, data, DEFAULT_IMPORTANCE)
    }

    /// Return every record of a table in a tier.
    ///
    /// Rows that fail to decompress or decode are skipped and counted. For L1
    /// the live hot-cache entries for the table follow the persisted rows, so
    /// a recent insert appears twice.
    pub fn retrieve_all(&self, tier: Tier, table: &str) -> Result<Retrieval> {
        let table: Table = table.parse()?;

        let decoded = self.tier(tier).load_records(table)?;
        let mut retrieval = Retrieval {
            records: decoded.records,
            skipped: decoded.skipped.len(),
            from_cache: 0,
        };

        if tier.is_cached() {
            let cached = self.cache.snapshot(table)?;
            retrieval.from_cache = cached.len();
            retrieval.records.extend(cached);
        }

        tracing::debug!(
            %tier,
            %table,
            records = retrieval.records.len(),
            skipped = retrieval.skipped,
            from_cache = retrieval.from_cache,
            "retrieved records"
        );
        Ok(retrieval)
    }

    /// Export a table's persisted records as one compressed JSON array.
    ///
    /// Uses the `backup` codec from the configuration, independent of the
    /// tier's own codec. Undecodable rows are left out and reported at warn.
    pub fn export_backup(&self, tier: Tier, table: &str) -> Result<Vec<u8>> {
        let table: Table = table.parse()?;
        let decoded = self.tier(tier).load_records(table)?;
        if !decoded.skipped.is_empty() {
            tracing::warn!(
                %tier,
                %table,
                skipped = decoded.skipped.len(),
                "backup export left out undecodable rows"
            );
        }
        let json = serde_json::to_vec(&decoded.records)?;
        let codec = self.config.backup_compression();
        let packed = codec.compress(&json)?;
        tracing::info!(
            %tier,
            %table,
            %codec,
            records = decoded.records.len(),
            bytes = packed.len(),
            "exported backup"
        );
        Ok(packed)
    }

    /// Decode a payload produced by [`TieredStore::export_backup`].
    pub fn decode_backup(&self, payload: &[u8]) -> Result<Vec<Value>> {
        let json = self.config.backup_compression().decompress(payload)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Row counts, cache size and gate counters.
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats {
            hot_cache_entries: self.cache.len()?,
            importance_breaches: self.gate.breaches(),
            ..Default::default()
        };
        for store in &self.tiers {
            let mut tables = BTreeMap::new();
            for table in Table::ALL {
                tables.insert(table, store.count(table)?);
            }
            stats.rows.insert(store.tier(), tables);
            stats.codecs.insert(store.tier(), store.codec());
        }
        Ok(stats)
    }

    /// Close every tier connection.
    ///
    /// All tiers are closed even if one fails; the first error is returned.
    pub fn close(self) -> Result<()> {
        let mut first_err: Option<Error> = None;
        for store in self.tiers {
            let tier = store.tier();
            if let Err(e) = store.close() {
                tracing::error!(%tier, error = %e, "failed to close tier store");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

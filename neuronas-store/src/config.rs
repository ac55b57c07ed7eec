//! Store configuration.
//!
//! Loaded from a JSON document whose `storage` section selects the codec per
//! tier and the importance threshold for the archival tier. Every field is
//! optional and falls back to a built-in default.

use crate::codec::Compression;
use crate::error::{Error, Result};
use crate::tier::Tier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default minimum importance for L3 inserts.
pub const DEFAULT_MIN_IMPORTANCE: f64 = 0.5;

/// Default hot-cache time-to-live in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 60;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub storage: StorageSection,
}

/// The `storage` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub compression: CompressionTable,
    pub importance: ImportanceSettings,
    pub cache: CacheSettings,
}

/// Codec selection per tier, plus the `backup` key used by archive exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionTable {
    #[serde(rename = "L1", skip_serializing_if = "Option::is_none")]
    pub l1: Option<AlgorithmSpec>,
    #[serde(rename = "L2", skip_serializing_if = "Option::is_none")]
    pub l2: Option<AlgorithmSpec>,
    #[serde(rename = "L3", skip_serializing_if = "Option::is_none")]
    pub l3: Option<AlgorithmSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<AlgorithmSpec>,
}

/// `{"algorithm": <name>}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Compression>,
}

impl AlgorithmSpec {
    pub fn new(algorithm: Compression) -> Self {
        Self {
            algorithm: Some(algorithm),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceSettings {
    pub min_threshold: f64,
}

impl Default for ImportanceSettings {
    fn default() -> Self {
        Self {
            min_threshold: DEFAULT_MIN_IMPORTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl StoreConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read or parsed is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid config document: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let threshold = self.storage.importance.min_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "importance.min_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.storage.cache.ttl_seconds == 0 {
            return Err(Error::Config("cache.ttl_seconds must be positive".into()));
        }
        Ok(())
    }

    /// Codec for a tier, falling back to `none`/`zlib`/`zstd` for L1/L2/L3.
    pub fn compression_for(&self, tier: Tier) -> Compression {
        let table = &self.storage.compression;
        let (spec, fallback) = match tier {
            Tier::L1 => (table.l1, Compression::None),
            Tier::L2 => (table.l2, Compression::Zlib),
            Tier::L3 => (table.l3, Compression::Zstd),
        };
        spec.and_then(|s| s.algorithm).unwrap_or(fallback)
    }

    /// Codec for backup exports.
    pub fn backup_compression(&self) -> Compression {
        self.storage
            .compression
            .backup
            .and_then(|s| s.algorithm)
            .unwrap_or(Compression::Zstd)
    }

    pub fn min_importance(&self) -> f64 {
        self.storage.importance.min_threshold
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.storage.cache.ttl_seconds)
    }

    /// Override the codec for one tier.
    pub fn with_compression(mut self, tier: Tier, algorithm: Compression) -> Self {
        let spec = Some(AlgorithmSpec::new(algorithm));
        match tier {
            Tier::L1 => self.storage.compression.l1 = spec,
            Tier::L2 => self.storage.compression.l2 = spec,
            Tier::L3 => self.storage.compression.l3 = spec,
        }
        self
    }

    pub fn with_min_importance(mut self, threshold: f64) -> Self {
        self.storage.importance.min_threshold = threshold;
        self
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.storage.cache.ttl_seconds = ttl_seconds;
        self
    }
}

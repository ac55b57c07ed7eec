//! # neuronas-store
//!
//! Three-tier record storage for the Neuronas application.
//!
//! ## Core Components
//!
//! - **Tiers**: L1/L2/L3, each with its own SQLite database and codec
//! - **Tables**: a fixed whitelist; other names are rejected before any I/O
//! - **Codecs**: none, zlib, zstd, chosen per tier by configuration
//! - **Hot cache**: uncompressed copies of recent L1 inserts with a TTL
//! - **Importance gate**: flags (never blocks) weak L3 inserts
//!
//! ## Example
//!
//! ```rust,ignore
//! use neuronas_store::{StoreConfig, TierPaths, TieredStore, Tier};
//! use serde_json::json;
//!
//! let store = TieredStore::open(StoreConfig::load("config.json")?, TierPaths::in_dir("data"))?;
//!
//! store.insert(Tier::L1, "memory", &json!("a"), 1.0)?;
//! let recent = store.retrieve_all(Tier::L1, "memory")?;
//! ```

pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
#[cfg(feature = "tokio-runtime")]
pub mod handle;
pub mod store;
pub mod tier;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::Compression;
pub use config::StoreConfig;
pub use error::{Error, Result};
#[cfg(feature = "tokio-runtime")]
pub use handle::StoreHandle;
pub use store::{
    GateDecision, ImportanceGate, InsertReceipt, Retrieval, StoreStats, TierPaths, TieredStore,
    DEFAULT_IMPORTANCE,
};
pub use tier::{Table, Tier};

//! Tiered storage with per-tier compression.
//!
//! - **L1**: uncompressed by default, mirrored into an in-memory TTL cache
//! - **L2**: general-purpose compression
//! - **L3**: archival compression, inserts checked by the importance gate
//!
//! Records are write-once: there is no update, delete, or movement between
//! tiers.

mod gate;
mod hot_cache;
mod schema;
mod tier_store;
mod tiered;

mod proptest;

pub use gate::{GateDecision, ImportanceGate, DEFAULT_IMPORTANCE};
pub use hot_cache::HotCache;
pub use schema::{initialize_schema, is_initialized, table_exists};
pub use tier_store::{DecodedRows, TierStore};
pub use tiered::{InsertReceipt, Retrieval, StoreStats, TierPaths, TieredStore};

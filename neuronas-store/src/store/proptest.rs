//! Property-based tests for the tiered store using proptest.
//!
//! - Any JSON value survives insert/retrieve on every codec
//! - Names outside the table whitelist never reach a database
//! - Repeated retrieval without inserts is stable

//! Storage tiers and the table whitelist.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical storage level.
///
/// Each tier owns a separate database and a fixed compression codec. Only
/// [`Tier::L1`] is mirrored into the in-memory TTL cache, and only
/// [`Tier::L3`] is subject to the importance gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    L1,
    L2,
    L3,
}

impl Tier {
    /// All tiers, hottest first.
    pub const ALL: [Tier; 3] = [Tier::L1, Tier::L2, Tier::L3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::L1 => "L1",
            Tier::L2 => "L2",
            Tier::L3 => "L3",
        }
    }

    /// Whether inserts into this tier are mirrored into the hot cache.
    pub fn is_cached(&self) -> bool {
        matches!(self, Tier::L1)
    }

    /// Whether inserts into this tier pass through the importance gate.
    pub fn is_gated(&self) -> bool {
        matches!(self, Tier::L3)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "L1" => Ok(Tier::L1),
            "L2" => Ok(Tier::L2),
            "L3" => Ok(Tier::L3),
            _ => Err(Error::InvalidTier(s.to_string())),
        }
    }
}

/// Whitelisted table.
///
/// Table names are interpolated into SQL, so only the strings returned by
/// [`Table::as_str`] ever reach a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Memory,
    Knowledge,
    Metrics,
    Settings,
    Hypotheses,
}

impl Table {
    /// The complete whitelist.
    pub const ALL: [Table; 5] = [
        Table::Memory,
        Table::Knowledge,
        Table::Metrics,
        Table::Settings,
        Table::Hypotheses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Memory => "memory",
            Table::Knowledge => "knowledge",
            Table::Metrics => "metrics",
            Table::Settings => "settings",
            Table::Hypotheses => "hypotheses",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = Error;

    /// Exact, case-sensitive match against the whitelist.
    fn from_str(s: &str) -> Result<Self> {
        Table::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidTable(s.to_string()))
    }
}

//! Importance gate for archival inserts.
//!
//! The gate never blocks a write. Records below the threshold are still
//! stored; the breach is reported and counted.

use crate::error::{Error, Result};
use crate::tier::{Table, Tier};
use std::sync::atomic::{AtomicU64, Ordering};

/// Default importance for inserts that do not supply one.
pub const DEFAULT_IMPORTANCE: f64 = 1.0;

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Tier is not gated
    NotApplicable,
    /// At or above the threshold
    Passed,
    /// Below the threshold; stored anyway
    BelowThreshold,
}

impl GateDecision {
    pub fn is_breach(&self) -> bool {
        matches!(self, GateDecision::BelowThreshold)
    }
}

/// Threshold check applied to L3 inserts.
#[derive(Debug)]
pub struct ImportanceGate {
    min_threshold: f64,
    breaches: AtomicU64,
}

impl ImportanceGate {
    pub fn new(min_threshold: f64) -> Self {
        Self {
            min_threshold,
            breaches: AtomicU64::new(0),
        }
    }

    pub fn min_threshold(&self) -> f64 {
        self.min_threshold
    }

    /// Reject scores that are not finite or fall outside [0, 1].
    pub fn validate(importance: f64) -> Result<()> {
        if importance.is_finite() && (0.0..=1.0).contains(&importance) {
            Ok(())
        } else {
            Err(Error::InvalidImportance(importance))
        }
    }

    /// Evaluate an insert. Emits one notice per below-threshold L3 insert.
    pub fn evaluate(&self, tier: Tier, table: Table, importance: f64) -> GateDecision {
        if !tier.is_gated() {
            return GateDecision::NotApplicable;
        }
        if importance >= self.min_threshold {
            return GateDecision::Passed;
        }

        self.breaches.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            %tier,
            %table,
            importance,
            threshold = self.min_threshold,
            "importance below archival threshold, storing anyway"
        );
        GateDecision::BelowThreshold
    }

    /// Number of below-threshold inserts seen so far.
    pub fn breaches(&self) -> u64 {
        self.breaches.load(Ordering::Relaxed)
    }
}

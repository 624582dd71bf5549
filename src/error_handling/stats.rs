//! Recovery statistics tracking.
//!
//! This module provides thread-safe counters for batch recovery outcomes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::FailureKind;

/// Thread-safe recovery statistics tracker.
///
/// Counts successes, idempotent skips, fatal errors and failures per
/// `FailureKind` using atomic counters, so concurrent recoveries can share one
/// instance through `Arc`. All failure kinds are initialized to zero on creation.
pub struct RecoveryStats {
    succeeded: AtomicUsize,
    skipped: AtomicUsize,
    fatal: AtomicUsize,
    failures: HashMap<FailureKind, AtomicUsize>,
}

impl RecoveryStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for kind in FailureKind::iter() {
            failures.insert(kind, AtomicUsize::new(0));
        }

        RecoveryStats {
            succeeded: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            fatal: AtomicUsize::new(0),
            failures,
        }
    }

    pub fn increment_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a recovery short-circuited by the idempotency guard.
    pub fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fatal(&self) {
        self.fatal.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment a failure counter.
    pub fn increment_failure(&self, kind: FailureKind) {
        if let Some(counter) = self.failures.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment failure counter for {:?} which is not in the map. \
                 This indicates a bug in RecoveryStats initialization.",
                kind
            );
        }
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn fatal(&self) -> usize {
        self.fatal.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self, kind: FailureKind) -> usize {
        self.failures
            .get(&kind)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Failures across every kind (fatal errors excluded).
    pub fn total_failures(&self) -> usize {
        self.failures
            .values()
            .map(|counter| counter.load(Ordering::Relaxed))
            .sum()
    }

    /// Snapshot of the non-zero failure counters.
    pub fn failure_breakdown(&self) -> Vec<(FailureKind, usize)> {
        FailureKind::iter()
            .map(|kind| (kind, self.failure_count(kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

impl Default for RecoveryStats {
    fn default() -> Self {
        Self::new()
    }
}

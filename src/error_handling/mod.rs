//! Error handling and recovery statistics.
//!
//! This module provides:
//! - Error type definitions for fetch, CDX, recovery and initialization
//! - Retry strategy configuration and retriability rules
//! - Failure categorization and thread-safe batch statistics

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{is_retriable, RetryPolicy};
pub use stats::RecoveryStats;
pub use types::{CdxError, FailureKind, FetchError, InitializationError, RecoveryError};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_recovery_stats_initialization() {
        let stats = RecoveryStats::new();
        for kind in FailureKind::iter() {
            assert_eq!(stats.failure_count(kind), 0);
        }
        assert_eq!(stats.succeeded(), 0);
        assert_eq!(stats.skipped(), 0);
        assert_eq!(stats.fatal(), 0);
    }

    #[test]
    fn test_recovery_stats_increment() {
        let stats = RecoveryStats::new();
        stats.increment_success();
        stats.increment_skipped();
        stats.increment_fatal();
        stats.increment_failure(FailureKind::RemovalNotice);
        stats.increment_failure(FailureKind::RemovalNotice);
        stats.increment_failure(FailureKind::FetchError);

        assert_eq!(stats.succeeded(), 1);
        assert_eq!(stats.skipped(), 1);
        assert_eq!(stats.fatal(), 1);
        assert_eq!(stats.failure_count(FailureKind::RemovalNotice), 2);
        assert_eq!(stats.total_failures(), 3);
    }

    #[test]
    fn test_failure_breakdown_skips_zero_counts() {
        let stats = RecoveryStats::new();
        stats.increment_failure(FailureKind::NoSnapshots);
        assert_eq!(
            stats.failure_breakdown(),
            vec![(FailureKind::NoSnapshots, 1)]
        );
    }

    #[test]
    fn test_recovery_stats_concurrent_increments() {
        let stats = std::sync::Arc::new(RecoveryStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = std::sync::Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.increment_failure(FailureKind::ParseFailure);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.failure_count(FailureKind::ParseFailure), 800);
    }
}

//! Batch statistics printing.

use log::info;
use serde_json::{json, Value};
use strum::IntoEnumIterator;

use crate::error_handling::FailureKind;
use crate::recovery::BatchReport;

/// Logs the per-kind failure counts of a batch.
pub fn print_failure_statistics(report: &BatchReport) {
    if report.failed == 0 && report.fatal == 0 {
        return;
    }

    if report.failed > 0 {
        info!("Failure Counts ({} total):", report.failed);
        for kind in FailureKind::iter() {
            let count = failure_count(report, kind);
            if count > 0 {
                info!("   {}: {}", kind.as_str(), count);
            }
        }
    }

    if report.fatal > 0 {
        info!("Fatal Errors ({} total):", report.fatal);
        for error in &report.errors {
            info!("   {} {}: {}", error.kind, error.entity_id, error.message);
        }
    }
}

fn failure_count(report: &BatchReport, kind: FailureKind) -> usize {
    report
        .failures_by_kind
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or(0, |(_, count)| *count)
}

/// Logs a one-line summary of a batch.
pub fn print_simple_summary(report: &BatchReport, elapsed_seconds: f64) {
    let rate = if elapsed_seconds > 0.0 {
        report.total as f64 / elapsed_seconds
    } else {
        0.0
    };
    info!(
        "Recovered {} of {} entit{} ({} failed, {} skipped, {} fatal) in {:.1}s (~{:.2} entities/sec)",
        report.succeeded,
        report.total,
        if report.total == 1 { "y" } else { "ies" },
        report.failed,
        report.skipped,
        report.fatal,
        elapsed_seconds,
        rate
    );
    if report.not_started > 0 {
        info!(
            "{} request(s) not started because the batch was cancelled",
            report.not_started
        );
    }
}

/// Machine-readable summary printed after the per-entity results.
pub fn summary_json(report: &BatchReport, elapsed_seconds: f64) -> Value {
    let failures: serde_json::Map<String, Value> = report
        .failures_by_kind
        .iter()
        .map(|(kind, count)| {
            (
                serde_json::to_value(kind)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| kind.as_str().to_string()),
                json!(count),
            )
        })
        .collect();
    json!({
        "summary": {
            "total": report.total,
            "succeeded": report.succeeded,
            "failed": report.failed,
            "skipped": report.skipped,
            "fatal": report.fatal,
            "not_started": report.not_started,
            "failures_by_kind": failures,
            "elapsed_seconds": (elapsed_seconds * 1000.0).round() / 1000.0,
        }
    })
}

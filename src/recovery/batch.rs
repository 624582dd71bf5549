//! Concurrent recovery of many independent entities.
//!
//! Each recovery runs as its own task, bounded by a semaphore. All tasks share
//! one orchestrator and therefore one rate limiter, so the global request rate
//! stays bounded however many recoveries run at once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use super::orchestrator::RecoveryOrchestrator;
use crate::error_handling::{FailureKind, RecoveryError, RecoveryStats};
use crate::models::{EntityKind, RecoveryReport};

/// One entity to recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryRequest {
    pub entity_id: String,
    pub kind: EntityKind,
    /// When the caller last recovered this entity, if ever
    pub last_recovered_at: Option<DateTime<Utc>>,
}

impl RecoveryRequest {
    pub fn new(kind: EntityKind, entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind,
            last_recovered_at: None,
        }
    }
}

/// A recovery that ended in a fatal error instead of a result.
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub entity_id: String,
    pub kind: EntityKind,
    pub message: String,
}

/// Aggregate outcome of a batch.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    /// Recoveries started
    pub total: usize,
    /// Successful recoveries, idempotent skips excluded
    pub succeeded: usize,
    /// Recoveries that ended with `success = false`
    pub failed: usize,
    /// Recoveries short-circuited by the idempotency guard
    pub skipped: usize,
    /// Recoveries that ended in a `RecoveryError`
    pub fatal: usize,
    /// Requests never started because the batch was cancelled
    pub not_started: usize,
    pub failures_by_kind: Vec<(FailureKind, usize)>,
    /// Results in request order
    pub results: Vec<RecoveryReport>,
    pub errors: Vec<BatchError>,
}

/// Recovers every request, at most `max_concurrency` at a time.
///
/// Per-entity failures never stop the batch. Once `cancel` fires no new
/// recovery starts, and running ones stop before their next snapshot. A fatal
/// error (unwritable cache, unreachable index) affects every entity, so it
/// stops the batch the same way.
pub async fn recover_batch(
    orchestrator: Arc<RecoveryOrchestrator>,
    requests: Vec<RecoveryRequest>,
    max_concurrency: usize,
    cancel: CancellationToken,
) -> BatchReport {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let stop = cancel.child_token();
    let mut tasks = FuturesUnordered::new();
    let mut not_started = 0;

    for (index, request) in requests.into_iter().enumerate() {
        let permit = tokio::select! {
            biased;
            _ = stop.cancelled() => None,
            permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            not_started += 1;
            continue;
        };

        let orchestrator = Arc::clone(&orchestrator);
        let stop = stop.clone();
        let task_request = request.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            let outcome = orchestrator
                .recover_cancellable(
                    &task_request.entity_id,
                    task_request.kind,
                    task_request.last_recovered_at,
                    Utc::now(),
                    &stop,
                )
                .await;
            if let Err(ref e) = outcome {
                log::error!("Stopping batch after fatal error: {}", e);
                stop.cancel();
            }
            outcome
        });
        // The request travels with the handle so a panicked task can still be named
        tasks.push(async move { (index, request, handle.await) });
    }

    let stats = RecoveryStats::new();
    let mut results: Vec<(usize, RecoveryReport)> = Vec::new();
    let mut errors: Vec<(usize, BatchError)> = Vec::new();
    while let Some((index, request, joined)) = tasks.next().await {
        match settle(&stats, request, joined) {
            Ok(report) => results.push((index, report)),
            Err(error) => errors.push((index, error)),
        }
    }
    results.sort_by_key(|(index, _)| *index);
    errors.sort_by_key(|(index, _)| *index);

    let report = BatchReport {
        total: stats.succeeded() + stats.skipped() + stats.total_failures() + stats.fatal(),
        succeeded: stats.succeeded(),
        failed: stats.total_failures(),
        skipped: stats.skipped(),
        fatal: stats.fatal(),
        not_started,
        failures_by_kind: stats.failure_breakdown(),
        results: results.into_iter().map(|(_, report)| report).collect(),
        errors: errors.into_iter().map(|(_, error)| error).collect(),
    };
    log::info!(
        "Batch finished: {} succeeded, {} failed, {} skipped, {} fatal, {} not started",
        report.succeeded,
        report.failed,
        report.skipped,
        report.fatal,
        report.not_started
    );
    report
}

/// Counts one finished task. A task that returned an error or never returned
/// at all is fatal and still names its entity.
fn settle(
    stats: &RecoveryStats,
    request: RecoveryRequest,
    joined: Result<Result<RecoveryReport, RecoveryError>, JoinError>,
) -> Result<RecoveryReport, BatchError> {
    match joined {
        Ok(Ok(report)) => {
            record(stats, &report);
            Ok(report)
        }
        Ok(Err(e)) => {
            stats.increment_fatal();
            Err(batch_error(request, e.to_string()))
        }
        Err(join_error) => {
            stats.increment_fatal();
            Err(batch_error(
                request,
                format!("recovery task failed: {join_error}"),
            ))
        }
    }
}

fn record(stats: &RecoveryStats, report: &RecoveryReport) {
    if report.is_idempotent_skip() {
        stats.increment_skipped();
    } else if report.success() {
        stats.increment_success();
    } else {
        stats.increment_failure(report.failure_kind().unwrap_or(FailureKind::ParseFailure));
    }
}

fn batch_error(request: RecoveryRequest, message: String) -> BatchError {
    log::error!(
        "Recovery of {} {} failed: {}",
        request.kind,
        request.entity_id,
        message
    );
    BatchError {
        entity_id: request.entity_id,
        kind: request.kind,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panicked_task_is_reported_for_its_entity() {
        let join_error = tokio::spawn(async { panic!("boom") })
            .await
            .unwrap_err();
        let stats = RecoveryStats::new();
        let request = RecoveryRequest::new(EntityKind::Video, "abc123def45");

        let error = settle(&stats, request, Err(join_error)).unwrap_err();

        assert_eq!(stats.fatal(), 1);
        assert_eq!(error.entity_id, "abc123def45");
        assert_eq!(error.kind, EntityKind::Video);
        assert!(error.message.starts_with("recovery task failed"));
    }
}

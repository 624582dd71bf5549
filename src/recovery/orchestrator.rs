//! Per-entity recovery state machine.
//!
//! One recovery runs strictly sequentially:
//! idempotency guard, snapshot lookup, then one snapshot at a time (oldest
//! first) until a snapshot yields data or every snapshot has been tried.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::cdx::{CdxClient, CdxSnapshot};
use crate::config::IDEMPOTENCY_WINDOW;
use crate::error_handling::{FailureKind, RecoveryError};
use crate::models::{
    Attempt, AttemptOutcome, ChannelRecoveryResult, EntityKind, RecoveredChannelData,
    RecoveredVideoData, RecoveryReport, RecoveryResult,
};
use crate::parse::{PageExtraction, PageParser, PageRecord};

/// Recovers entity metadata from archived snapshots.
///
/// Cheap to clone; clones share the CDX cache, fetcher and rate limiter.
#[derive(Clone)]
pub struct RecoveryOrchestrator {
    cdx: CdxClient,
    parser: PageParser,
    idempotency_window: Duration,
}

impl RecoveryOrchestrator {
    pub fn new(cdx: CdxClient, parser: PageParser) -> Self {
        Self {
            cdx,
            parser,
            idempotency_window: IDEMPOTENCY_WINDOW,
        }
    }

    pub fn cdx(&self) -> &CdxClient {
        &self.cdx
    }

    pub fn parser(&self) -> &PageParser {
        &self.parser
    }

    /// Recovers a video or channel.
    ///
    /// `last_recovered_at` comes from the caller's store; a recovery within
    /// the idempotency window of `now` succeeds immediately without any I/O.
    ///
    /// # Errors
    ///
    /// Returns `RecoveryError` only for systemic failures (unwritable cache,
    /// invalid endpoint). Everything else is reported on the result.
    pub async fn recover(
        &self,
        entity_id: &str,
        kind: EntityKind,
        last_recovered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<RecoveryReport, RecoveryError> {
        self.recover_cancellable(
            entity_id,
            kind,
            last_recovered_at,
            now,
            &CancellationToken::new(),
        )
        .await
    }

    /// Like `recover`, but stops between snapshot attempts once `cancel` fires.
    pub async fn recover_cancellable(
        &self,
        entity_id: &str,
        kind: EntityKind,
        last_recovered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RecoveryReport, RecoveryError> {
        Ok(match kind {
            EntityKind::Video => RecoveryReport::Video(
                self.run::<RecoveredVideoData>(entity_id, kind, last_recovered_at, now, cancel)
                    .await?
                    .into(),
            ),
            EntityKind::Channel => RecoveryReport::Channel(
                self.run::<RecoveredChannelData>(entity_id, kind, last_recovered_at, now, cancel)
                    .await?
                    .into(),
            ),
        })
    }

    /// Recovers a video's metadata.
    pub async fn recover_video(
        &self,
        video_id: &str,
        last_recovered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<RecoveryResult, RecoveryError> {
        let attempt = self
            .run::<RecoveredVideoData>(
                video_id,
                EntityKind::Video,
                last_recovered_at,
                now,
                &CancellationToken::new(),
            )
            .await?;
        Ok(attempt.into())
    }

    /// Recovers a channel's metadata.
    pub async fn recover_channel(
        &self,
        channel_id: &str,
        last_recovered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<ChannelRecoveryResult, RecoveryError> {
        let attempt = self
            .run::<RecoveredChannelData>(
                channel_id,
                EntityKind::Channel,
                last_recovered_at,
                now,
                &CancellationToken::new(),
            )
            .await?;
        Ok(attempt.into())
    }

    fn recently_recovered(&self, last_recovered_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(last) = last_recovered_at else {
            return false;
        };
        match chrono::Duration::from_std(self.idempotency_window) {
            Ok(window) => now.signed_duration_since(last) < window,
            Err(_) => true,
        }
    }

    async fn run<T: PageRecord>(
        &self,
        entity_id: &str,
        kind: EntityKind,
        last_recovered_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Attempt<T>, RecoveryError> {
        let started = Instant::now();
        let finish = |available: usize, tried: usize, outcome: AttemptOutcome<T>| Attempt {
            entity_id: entity_id.to_string(),
            snapshots_available: available,
            snapshots_tried: tried,
            duration_seconds: started.elapsed().as_secs_f64(),
            outcome,
        };

        if self.recently_recovered(last_recovered_at, now) {
            log::info!(
                "Skipping {} {}: recovered within the last {}s",
                kind,
                entity_id,
                self.idempotency_window.as_secs()
            );
            return Ok(finish(0, 0, AttemptOutcome::AlreadyRecovered));
        }

        let target_url = kind.target_url(entity_id);
        let snapshots = match self.cdx.get_snapshots(entity_id, &target_url).await {
            Ok(snapshots) => snapshots,
            Err(e) if e.is_fatal() => {
                log::error!("Recovery of {} {} aborted: {}", kind, entity_id, e);
                return Err(e.into());
            }
            Err(e) => {
                log::warn!("Snapshot index unavailable for {} {}: {}", kind, entity_id, e);
                return Ok(finish(
                    0,
                    0,
                    AttemptOutcome::Failed {
                        kind: FailureKind::IndexUnavailable,
                        reason: format!("snapshot index unavailable: {e}"),
                    },
                ));
            }
        };

        if snapshots.is_empty() {
            log::info!("No eligible snapshots of {} {}", kind, entity_id);
            return Ok(finish(
                0,
                0,
                AttemptOutcome::Failed {
                    kind: FailureKind::NoSnapshots,
                    reason: FailureKind::NoSnapshots.as_str().to_string(),
                },
            ));
        }

        let total = snapshots.len();
        let mut tried = 0;
        let mut last_failure: Option<(FailureKind, String)> = None;
        for snapshot in &snapshots {
            if cancel.is_cancelled() {
                log::info!(
                    "Recovery of {} {} cancelled after {} of {} snapshots",
                    kind,
                    entity_id,
                    tried,
                    total
                );
                return Ok(finish(
                    total,
                    tried,
                    AttemptOutcome::Failed {
                        kind: FailureKind::Cancelled,
                        reason: format!("cancelled after {tried} of {total} snapshots"),
                    },
                ));
            }

            tried += 1;
            match self.try_snapshot::<T>(entity_id, snapshot).await {
                Ok(data) => {
                    log::info!(
                        "Recovered {} field(s) of {} {} from snapshot {} ({} of {})",
                        data.recovered_count(),
                        kind,
                        entity_id,
                        snapshot.timestamp,
                        tried,
                        total
                    );
                    return Ok(finish(total, tried, AttemptOutcome::Recovered(data)));
                }
                Err(failure) => last_failure = Some(failure),
            }
        }

        let (kind_of_last, last_reason) = last_failure.unwrap_or((
            FailureKind::ParseFailure,
            "no snapshot yielded data".to_string(),
        ));
        log::info!(
            "Recovery of {} {} exhausted {} snapshot(s)",
            kind,
            entity_id,
            total
        );
        Ok(finish(
            total,
            tried,
            AttemptOutcome::Failed {
                kind: kind_of_last,
                reason: format!("tried {tried} of {total} snapshots; last failure: {last_reason}"),
            },
        ))
    }

    /// Tries one snapshot; `Err` carries why it was not usable.
    async fn try_snapshot<T: PageRecord>(
        &self,
        entity_id: &str,
        snapshot: &CdxSnapshot,
    ) -> Result<T, (FailureKind, String)> {
        log::debug!("Trying snapshot {} of {}", snapshot.timestamp, entity_id);
        match self.parser.extract::<T>(snapshot).await {
            Ok(PageExtraction::Recovered { data, warnings }) => {
                for warning in warnings {
                    log::warn!("{} snapshot {}: {}", entity_id, snapshot.timestamp, warning);
                }
                Ok(data)
            }
            Ok(PageExtraction::RemovalNotice(notice)) => {
                log::info!(
                    "{} snapshot {} shows a removal notice ({})",
                    entity_id,
                    snapshot.timestamp,
                    notice
                );
                Err((
                    FailureKind::RemovalNotice,
                    format!("snapshot {} shows a removal notice ({notice})", snapshot.timestamp),
                ))
            }
            Ok(PageExtraction::NoUsableData(reason)) => {
                log::warn!("{} snapshot {}: {}", entity_id, snapshot.timestamp, reason);
                Err((
                    FailureKind::ParseFailure,
                    format!("snapshot {}: {reason}", snapshot.timestamp),
                ))
            }
            Err(e) => {
                log::warn!(
                    "{} snapshot {} could not be fetched: {}",
                    entity_id,
                    snapshot.timestamp,
                    e
                );
                Err((
                    FailureKind::FetchError,
                    format!("snapshot {} could not be fetched: {e}", snapshot.timestamp),
                ))
            }
        }
    }
}

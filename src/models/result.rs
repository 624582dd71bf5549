//! Caller-facing recovery results.
//!
//! A result describes one recovery attempt. It is built once when the attempt
//! ends and never changes afterwards.

use std::collections::BTreeSet;

use serde::Serialize;

use super::recovered::{RecoveredChannelData, RecoveredRecord, RecoveredVideoData};
use crate::error_handling::FailureKind;

/// Outcome of a video recovery.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryResult {
    pub entity_id: String,
    pub success: bool,
    /// Timestamp of the snapshot the fields came from
    pub snapshot_used: Option<String>,
    pub fields_recovered: BTreeSet<&'static str>,
    pub fields_skipped: BTreeSet<&'static str>,
    pub snapshots_available: usize,
    pub snapshots_tried: usize,
    pub failure_reason: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub duration_seconds: f64,
    /// Channel ids found on the watch page, for follow-up channel recovery
    pub channel_recovery_candidates: BTreeSet<String>,
    /// The recovered record, for the caller to persist
    pub data: Option<RecoveredVideoData>,
}

/// Outcome of a channel recovery.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelRecoveryResult {
    pub entity_id: String,
    pub success: bool,
    pub snapshot_used: Option<String>,
    pub fields_recovered: BTreeSet<&'static str>,
    pub fields_skipped: BTreeSet<&'static str>,
    pub snapshots_available: usize,
    pub snapshots_tried: usize,
    pub failure_reason: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub duration_seconds: f64,
    pub data: Option<RecoveredChannelData>,
}

/// Kind-agnostic recovery outcome, converted into the typed results above.
#[derive(Debug, Clone)]
pub(crate) struct Attempt<T> {
    pub(crate) entity_id: String,
    pub(crate) snapshots_available: usize,
    pub(crate) snapshots_tried: usize,
    pub(crate) duration_seconds: f64,
    pub(crate) outcome: AttemptOutcome<T>,
}

#[derive(Debug, Clone)]
pub(crate) enum AttemptOutcome<T> {
    /// Recovered within the idempotency window; nothing was fetched.
    AlreadyRecovered,
    Recovered(T),
    Failed { kind: FailureKind, reason: String },
}

/// Splits field names into (present, absent).
fn partition<T: RecoveredRecord>(data: &T) -> (BTreeSet<&'static str>, BTreeSet<&'static str>) {
    let (recovered, skipped): (Vec<_>, Vec<_>) = data
        .field_presence()
        .into_iter()
        .partition(|(_, present)| *present);
    (
        recovered.into_iter().map(|(name, _)| name).collect(),
        skipped.into_iter().map(|(name, _)| name).collect(),
    )
}

/// Fields shared by both result types.
struct Common<T> {
    entity_id: String,
    success: bool,
    snapshot_used: Option<String>,
    fields_recovered: BTreeSet<&'static str>,
    fields_skipped: BTreeSet<&'static str>,
    snapshots_available: usize,
    snapshots_tried: usize,
    failure_reason: Option<String>,
    failure_kind: Option<FailureKind>,
    duration_seconds: f64,
    data: Option<T>,
}

impl<T: RecoveredRecord> From<Attempt<T>> for Common<T> {
    fn from(attempt: Attempt<T>) -> Self {
        let Attempt {
            entity_id,
            snapshots_available,
            snapshots_tried,
            duration_seconds,
            outcome,
        } = attempt;
        let mut common = Common {
            entity_id,
            success: false,
            snapshot_used: None,
            fields_recovered: BTreeSet::new(),
            fields_skipped: BTreeSet::new(),
            snapshots_available,
            snapshots_tried,
            failure_reason: None,
            failure_kind: None,
            duration_seconds,
            data: None,
        };
        match outcome {
            AttemptOutcome::AlreadyRecovered => {
                common.success = true;
            }
            AttemptOutcome::Recovered(data) => {
                let (recovered, skipped) = partition(&data);
                common.success = true;
                common.snapshot_used = Some(data.snapshot_timestamp().to_string());
                common.fields_recovered = recovered;
                common.fields_skipped = skipped;
                common.data = Some(data);
            }
            AttemptOutcome::Failed { kind, reason } => {
                common.failure_kind = Some(kind);
                common.failure_reason = Some(reason);
            }
        }
        common
    }
}

impl From<Attempt<RecoveredVideoData>> for RecoveryResult {
    fn from(attempt: Attempt<RecoveredVideoData>) -> Self {
        let common = Common::from(attempt);
        let channel_recovery_candidates = common
            .data
            .as_ref()
            .map(|data| data.channel_candidates())
            .unwrap_or_default();
        RecoveryResult {
            entity_id: common.entity_id,
            success: common.success,
            snapshot_used: common.snapshot_used,
            fields_recovered: common.fields_recovered,
            fields_skipped: common.fields_skipped,
            snapshots_available: common.snapshots_available,
            snapshots_tried: common.snapshots_tried,
            failure_reason: common.failure_reason,
            failure_kind: common.failure_kind,
            duration_seconds: common.duration_seconds,
            channel_recovery_candidates,
            data: common.data,
        }
    }
}

impl From<Attempt<RecoveredChannelData>> for ChannelRecoveryResult {
    fn from(attempt: Attempt<RecoveredChannelData>) -> Self {
        let common = Common::from(attempt);
        ChannelRecoveryResult {
            entity_id: common.entity_id,
            success: common.success,
            snapshot_used: common.snapshot_used,
            fields_recovered: common.fields_recovered,
            fields_skipped: common.fields_skipped,
            snapshots_available: common.snapshots_available,
            snapshots_tried: common.snapshots_tried,
            failure_reason: common.failure_reason,
            failure_kind: common.failure_kind,
            duration_seconds: common.duration_seconds,
            data: common.data,
        }
    }
}

/// Result of either kind of recovery.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecoveryReport {
    Video(RecoveryResult),
    Channel(ChannelRecoveryResult),
}

impl RecoveryReport {
    pub fn entity_id(&self) -> &str {
        match self {
            RecoveryReport::Video(r) => &r.entity_id,
            RecoveryReport::Channel(r) => &r.entity_id,
        }
    }

    pub fn success(&self) -> bool {
        match self {
            RecoveryReport::Video(r) => r.success,
            RecoveryReport::Channel(r) => r.success,
        }
    }

    pub fn snapshots_tried(&self) -> usize {
        match self {
            RecoveryReport::Video(r) => r.snapshots_tried,
            RecoveryReport::Channel(r) => r.snapshots_tried,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RecoveryReport::Video(r) => r.failure_kind,
            RecoveryReport::Channel(r) => r.failure_kind,
        }
    }

    /// True for the idempotency short-circuit: successful, nothing tried.
    pub fn is_idempotent_skip(&self) -> bool {
        self.success() && self.snapshots_tried() == 0
    }
}

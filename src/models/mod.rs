//! Data model for recovery targets, recovered records and results.

mod entity;
mod recovered;
mod result;

pub use entity::EntityKind;
pub use recovered::{
    RecoveredChannelData, RecoveredRecord, RecoveredVideoData, CHANNEL_FIELDS, VIDEO_FIELDS,
};
pub use result::{ChannelRecoveryResult, RecoveryReport, RecoveryResult};

pub(crate) use result::{Attempt, AttemptOutcome};

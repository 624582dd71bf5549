//! Metadata recovery.
//!
//! This module provides:
//! - `RecoveryOrchestrator`, which recovers one entity from its snapshots
//! - `recover_batch`, which recovers many entities concurrently

mod batch;
mod orchestrator;

// Re-export public API
pub use batch::{recover_batch, BatchError, BatchReport, RecoveryRequest};
pub use orchestrator::RecoveryOrchestrator;

//! wayback_recovery library: metadata recovery from archived snapshots
//!
//! This library recovers metadata for deleted YouTube videos and channels from
//! Wayback Machine captures. For each entity it lists the archived captures of
//! the canonical page through the CDX index (cached on disk), skips captures
//! that only show a removal notice, and extracts title, description, counts,
//! dates and other fields from the first capture that still holds them.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use wayback_recovery::{build_orchestrator, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     cache_dir: std::path::PathBuf::from("/tmp/wayback-cdx"),
//!     rate_limit_rps: 5,
//!     ..Default::default()
//! };
//! let orchestrator = build_orchestrator(&config)?;
//!
//! let result = orchestrator
//!     .recover_video("dQw4w9WgXcQ", None, Utc::now())
//!     .await?;
//! if let Some(data) = &result.data {
//!     println!("Recovered {:?} from {:?}", data.title, result.snapshot_used);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod app;
pub mod cdx;
pub mod config;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod models;
pub mod parse;
pub mod recovery;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{FailureKind, RecoveryError};
pub use initialization::build_orchestrator;
pub use models::{
    ChannelRecoveryResult, EntityKind, RecoveredChannelData, RecoveredVideoData, RecoveryReport,
    RecoveryResult,
};
pub use recovery::{recover_batch, BatchReport, RecoveryOrchestrator, RecoveryRequest};

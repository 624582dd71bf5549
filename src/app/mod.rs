//! Binary support.
//!
//! This module provides request file parsing, interrupt handling and the
//! batch statistics printed by the `wayback_recovery` binary.

pub mod requests;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use requests::{parse_request_line, parse_requests, read_requests};
pub use shutdown::cancel_on_interrupt;
pub use statistics::{print_failure_statistics, print_simple_summary, summary_json};

//! Configuration constants.
//!
//! This module defines the defaults for every configurable option plus the fixed
//! policy constants used by the recovery pipeline.

use std::time::Duration;

// Archive endpoints
/// Wayback Machine CDX index endpoint.
pub const DEFAULT_CDX_BASE_URL: &str = "https://web.archive.org/cdx/search/cdx";
/// Wayback Machine replay prefix; snapshots live at `{prefix}/{timestamp}/{original_url}`.
pub const DEFAULT_REPLAY_BASE_URL: &str = "https://web.archive.org/web";

/// Default on-disk location of the CDX cache.
pub const DEFAULT_CACHE_DIR: &str = ".wayback_cache";

// Rate limiting
/// Requests per second across all archive traffic.
/// Stays under the archive's fair-use threshold for anonymous clients.
pub const DEFAULT_RATE_LIMIT_RPS: u32 = 40;

// Network operation timeouts
/// Per-request timeout in seconds.
/// Archived watch pages are large and the replay service is often slow; 30s bounds
/// the worst case without cutting off healthy responses.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Retry strategy
/// Delay before the first retry, in milliseconds. Later retries double it.
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Maximum delay between retries in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 15;
/// Maximum number of attempts per request (initial attempt included).
pub const RETRY_MAX_ATTEMPTS: usize = 4;

// CDX cache
/// Freshness window for cached CDX listings (24 hours).
/// Snapshot history of a deleted URL changes rarely.
pub const CDX_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// Snapshot eligibility
/// Captures at or below this size are redirect or placeholder shells.
pub const MIN_SNAPSHOT_CONTENT_LENGTH: u64 = 5000;
/// Only HTML captures are parsed.
pub const ELIGIBLE_MIMETYPE: &str = "text/html";
/// Only captures of a 200 response are parsed.
pub const ELIGIBLE_STATUS_CODE: u16 = 200;

// Response and body size limits
/// Maximum response body size in bytes (8MB).
/// Modern watch pages are ~1MB; anything far larger is not a page we can use.
pub const MAX_RESPONSE_BODY_SIZE: usize = 8 * 1024 * 1024;

// Recovery policy
/// An entity recovered within this window is not recovered again.
pub const IDEMPOTENCY_WINDOW: Duration = Duration::from_secs(5 * 60);
/// Static extraction yielding fewer fields than this consults the page renderer.
pub const MIN_STATIC_FIELDS: usize = 3;

/// Batch recovery concurrency.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default User-Agent string for archive requests.
///
/// Automated clients identify themselves to the archive instead of posing as a browser.
pub const DEFAULT_USER_AGENT: &str = concat!("wayback_recovery/", env!("CARGO_PKG_VERSION"));

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

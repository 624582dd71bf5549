//! Application initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - Logger
//! - HTTP client (with timeouts and user agent)
//! - Rate limiter shared by every archive request
//! - CDX cache directory
//! - The fully wired `RecoveryOrchestrator`
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;
mod rate_limiter;

use std::path::Path;
use std::time::Duration;

use crate::cdx::{CdxCache, CdxClient};
use crate::config::Config;
use crate::error_handling::{InitializationError, RetryPolicy};
use crate::fetch::HttpFetcher;
use crate::parse::PageParser;
use crate::recovery::RecoveryOrchestrator;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use rate_limiter::{init_rate_limiter, RateLimiter};

/// Ensures the cache directory exists and accepts new files.
///
/// An unwritable cache is a configuration error, so it is reported once at
/// startup instead of on every recovery.
///
/// # Errors
///
/// Returns `InitializationError::CacheDirError` if the directory cannot be
/// created or a file cannot be created inside it.
pub fn init_cache_dir(path: &Path) -> Result<CdxCache, InitializationError> {
    let cache_dir_error = |source| InitializationError::CacheDirError {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(path).map_err(cache_dir_error)?;
    tempfile::NamedTempFile::new_in(path).map_err(cache_dir_error)?;
    Ok(CdxCache::new(path))
}

/// Retry policy described by the configuration.
pub fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy::new(
        config.retry_max_attempts.max(1),
        Duration::from_millis(config.retry_initial_delay_ms),
        Duration::from_secs(config.retry_max_delay_secs),
    )
}

/// Builds a recovery orchestrator from the configuration.
///
/// The CDX client and the page parser share one HTTP client and one rate
/// limiter.
///
/// # Errors
///
/// Returns an `InitializationError` if the HTTP client cannot be built, the
/// cache directory is unusable or an endpoint URL is invalid.
pub fn build_orchestrator(config: &Config) -> Result<RecoveryOrchestrator, InitializationError> {
    let client = init_client(config)?;
    let limiter = init_rate_limiter(config.rate_limit_rps, config.burst());
    let fetcher = HttpFetcher::new(client, limiter, retry_policy(config));

    let cache = init_cache_dir(&config.cache_dir)?;
    let cdx = CdxClient::new(
        fetcher.clone(),
        &config.cdx_base_url,
        cache,
        config.cache_ttl(),
    )
    .map_err(|_| InitializationError::EndpointError(config.cdx_base_url.clone()))?;
    let parser = PageParser::new(fetcher, &config.replay_base_url)
        .map_err(|_| InitializationError::EndpointError(config.replay_base_url.clone()))?;

    log::debug!(
        "Recovery initialized: cache {}, {} rps, {} attempt(s) per request",
        config.cache_dir.display(),
        config.rate_limit_rps,
        config.retry_max_attempts
    );
    Ok(RecoveryOrchestrator::new(cdx, parser))
}

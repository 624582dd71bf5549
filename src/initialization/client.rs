//! HTTP client initialization.

use crate::config::Config;
use reqwest::ClientBuilder;

/// Initializes the HTTP client used for CDX queries and snapshot replays.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the configuration
/// - Per-request timeout from the configuration
/// - Redirect following enabled (the replay service redirects to the nearest capture)
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(config.timeout())
        .connect_timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()
}

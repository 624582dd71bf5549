//! Configuration types and CLI options.
//!
//! This module defines the library `Config` struct, the clap-derived `Opt`
//! used by the binary, and the logging enums shared by both.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    CDX_CACHE_TTL, DEFAULT_CACHE_DIR, DEFAULT_CDX_BASE_URL, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_RATE_LIMIT_RPS, DEFAULT_REPLAY_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_SECS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use wayback_recovery::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     cache_dir: PathBuf::from("/var/cache/wayback"),
///     rate_limit_rps: 10,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one CDX cache file per entity
    pub cache_dir: PathBuf,

    /// CDX index endpoint
    pub cdx_base_url: String,

    /// Replay prefix (`{replay_base_url}/{timestamp}/{original_url}`)
    pub replay_base_url: String,

    /// Requests per second shared by every archive request
    pub rate_limit_rps: u32,

    /// Token bucket capacity; `None` means one second worth of tokens
    pub rate_limit_burst: Option<u32>,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Attempts per request, initial attempt included
    pub retry_max_attempts: usize,

    /// Delay before the first retry in milliseconds
    pub retry_initial_delay_ms: u64,

    /// Upper bound for any single retry delay in seconds
    pub retry_max_delay_secs: u64,

    /// CDX cache freshness window in seconds
    pub cache_ttl_secs: u64,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Concurrent recoveries in batch mode
    pub max_concurrency: usize,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// CDX cache TTL as a `Duration`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Token bucket capacity, defaulting to the refill rate.
    pub fn burst(&self) -> u32 {
        self.rate_limit_burst.unwrap_or(self.rate_limit_rps).max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cdx_base_url: DEFAULT_CDX_BASE_URL.to_string(),
            replay_base_url: DEFAULT_REPLAY_BASE_URL.to_string(),
            rate_limit_rps: DEFAULT_RATE_LIMIT_RPS,
            rate_limit_burst: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            retry_max_attempts: RETRY_MAX_ATTEMPTS,
            retry_initial_delay_ms: RETRY_INITIAL_DELAY_MS,
            retry_max_delay_secs: RETRY_MAX_DELAY_SECS,
            cache_ttl_secs: CDX_CACHE_TTL.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

/// Command-line options.
///
/// Every option can also be supplied through a `WAYBACK_*` environment variable.
///
/// # Examples
///
/// ```bash
/// # Recover everything listed in requests.txt
/// wayback_recovery requests.txt
///
/// # Slower, with a custom cache location
/// WAYBACK_CACHE_DIR=/tmp/cdx wayback_recovery requests.txt --rate-limit-rps 5
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "wayback_recovery",
    about = "Recovers metadata for deleted YouTube videos and channels from the Wayback Machine."
)]
pub struct Opt {
    /// File with one `video <id>` or `channel <id>` request per line
    #[arg(value_parser)]
    pub file: PathBuf,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, env = "WAYBACK_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, env = "WAYBACK_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// CDX cache directory
    #[arg(long, value_parser, default_value = DEFAULT_CACHE_DIR, env = "WAYBACK_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// CDX index endpoint
    #[arg(long, default_value = DEFAULT_CDX_BASE_URL, env = "WAYBACK_CDX_BASE_URL")]
    pub cdx_base_url: String,

    /// Snapshot replay prefix
    #[arg(long, default_value = DEFAULT_REPLAY_BASE_URL, env = "WAYBACK_REPLAY_BASE_URL")]
    pub replay_base_url: String,

    /// Archive requests per second (shared across all concurrent recoveries)
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT_RPS, env = "WAYBACK_RATE_LIMIT_RPS")]
    pub rate_limit_rps: u32,

    /// Token bucket capacity (defaults to the per-second rate)
    #[arg(long, env = "WAYBACK_RATE_LIMIT_BURST")]
    pub rate_limit_burst: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, env = "WAYBACK_TIMEOUT_SECONDS")]
    pub timeout_seconds: u64,

    /// Attempts per request, initial attempt included
    #[arg(long, default_value_t = RETRY_MAX_ATTEMPTS, env = "WAYBACK_RETRY_MAX_ATTEMPTS")]
    pub retry_max_attempts: usize,

    /// Delay before the first retry in milliseconds
    #[arg(
        long,
        default_value_t = RETRY_INITIAL_DELAY_MS,
        env = "WAYBACK_RETRY_INITIAL_DELAY_MS"
    )]
    pub retry_initial_delay_ms: u64,

    /// Upper bound for any single retry delay in seconds
    #[arg(long, default_value_t = RETRY_MAX_DELAY_SECS, env = "WAYBACK_RETRY_MAX_DELAY_SECS")]
    pub retry_max_delay_secs: u64,

    /// CDX cache freshness window in seconds
    #[arg(long, default_value_t = CDX_CACHE_TTL.as_secs(), env = "WAYBACK_CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "WAYBACK_USER_AGENT")]
    pub user_agent: String,

    /// Concurrent recoveries
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY, env = "WAYBACK_MAX_CONCURRENCY")]
    pub max_concurrency: usize,
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        Config {
            cache_dir: opt.cache_dir,
            cdx_base_url: opt.cdx_base_url,
            replay_base_url: opt.replay_base_url,
            rate_limit_rps: opt.rate_limit_rps,
            rate_limit_burst: opt.rate_limit_burst,
            timeout_seconds: opt.timeout_seconds,
            retry_max_attempts: opt.retry_max_attempts,
            retry_initial_delay_ms: opt.retry_initial_delay_ms,
            retry_max_delay_secs: opt.retry_max_delay_secs,
            cache_ttl_secs: opt.cache_ttl_secs,
            user_agent: opt.user_agent,
            max_concurrency: opt.max_concurrency,
            log_level: opt.log_level,
            log_format: opt.log_format,
        }
    }
}

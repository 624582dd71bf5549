//! Error type definitions.
//!
//! This module defines the typed errors raised by the fetch, CDX and recovery
//! layers, and the failure kinds recorded on unsuccessful recoveries.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The cache directory cannot be created or written.
    #[error("Cache directory {path} is not writable: {source}")]
    CacheDirError {
        /// Configured cache directory
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A configured endpoint is not a valid absolute URL.
    #[error("Invalid endpoint URL '{0}'")]
    EndpointError(String),
}

/// Errors from a single outbound archive request (after retries).
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete within the per-request timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// The connection could not be established.
    #[error("connection to {url} failed: {source}")]
    Connect {
        /// Requested URL
        url: String,
        /// Underlying transport error
        #[source]
        source: ReqwestError,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body exceeded `MAX_RESPONSE_BODY_SIZE`.
    #[error("response body from {url} exceeds {limit} bytes")]
    BodyTooLarge {
        /// Requested URL
        url: String,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Any other transport-level failure (request, body, decode).
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying transport error
        #[source]
        source: ReqwestError,
    },

    /// The URL could not be built.
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
}

impl FetchError {
    /// Categorizes a `reqwest::Error` raised while sending or reading a request.
    pub fn from_reqwest(url: &str, error: ReqwestError) -> Self {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                source: error,
            }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source: error,
            }
        }
    }

    /// HTTP status code, if the failure was a status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from the CDX index client.
#[derive(Error, Debug)]
pub enum CdxError {
    /// The index query failed after all retry attempts.
    #[error("CDX query for {url} failed: {source}")]
    Query {
        /// Target URL that was being looked up
        url: String,
        /// Last fetch failure
        #[source]
        source: FetchError,
    },

    /// The index answered with something that is not a JSON array of rows.
    #[error("CDX response for {url} is not valid JSON: {source}")]
    Decode {
        /// Target URL that was being looked up
        url: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// The on-disk cache could not be written.
    #[error("CDX cache error at {path}: {source}")]
    Cache {
        /// Cache file or directory
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The CDX endpoint refused or could not open a connection.
    #[error("CDX endpoint {endpoint} is unreachable: {source}")]
    Unreachable {
        /// Configured endpoint
        endpoint: String,
        /// Connection failure
        #[source]
        source: FetchError,
    },

    /// The configured CDX endpoint is not a valid URL.
    #[error("invalid CDX endpoint '{0}'")]
    Endpoint(String),
}

impl CdxError {
    /// Whether the error indicates misconfiguration rather than archive flakiness.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CdxError::Cache { .. } | CdxError::Unreachable { .. } | CdxError::Endpoint(_)
        )
    }
}

/// Fatal errors surfaced from a recovery call.
///
/// Per-snapshot failures never appear here; they end up on the result.
#[derive(Error, Debug)]
pub enum RecoveryError {
    /// A fatal CDX error (cache unwritable, endpoint invalid or unreachable).
    #[error(transparent)]
    Cdx(#[from] CdxError),
}

/// Why an unsuccessful recovery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIterMacro)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The index holds no eligible capture of the target URL
    NoSnapshots,
    /// The index query itself failed after retries
    IndexUnavailable,
    /// The last snapshot tried was a removal notice
    RemovalNotice,
    /// The last snapshot tried had no usable metadata
    ParseFailure,
    /// The last snapshot tried could not be fetched
    FetchError,
    /// The caller cancelled the recovery
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NoSnapshots => "no snapshots available",
            FailureKind::IndexUnavailable => "snapshot index unavailable",
            FailureKind::RemovalNotice => "removal notice",
            FailureKind::ParseFailure => "parse failure",
            FailureKind::FetchError => "fetch error",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

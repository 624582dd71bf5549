//! CDX data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ELIGIBLE_MIMETYPE, ELIGIBLE_STATUS_CODE, MIN_SNAPSHOT_CONTENT_LENGTH};

/// One archived capture of a URL, as listed by the CDX index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdxSnapshot {
    /// 14-digit capture timestamp (`YYYYMMDDhhmmss`)
    pub timestamp: String,
    /// URL as it was captured
    pub original_url: String,
    pub mimetype: String,
    /// HTTP status of the captured response
    pub status_code: u16,
    /// Content digest; identical digests mean identical captured bytes
    pub digest: String,
    /// Compressed capture length in bytes
    pub content_length: u64,
}

impl CdxSnapshot {
    /// Whether this capture is worth fetching.
    ///
    /// Only HTML captures of a 200 response larger than
    /// `MIN_SNAPSHOT_CONTENT_LENGTH` qualify; smaller pages are almost always
    /// redirect or placeholder shells.
    pub fn is_eligible(&self) -> bool {
        self.mimetype == ELIGIBLE_MIMETYPE
            && self.status_code == ELIGIBLE_STATUS_CODE
            && self.content_length > MIN_SNAPSHOT_CONTENT_LENGTH
    }

    /// Four-digit capture year, if the timestamp is well formed.
    pub fn year(&self) -> Option<i32> {
        self.timestamp.get(..4)?.parse().ok()
    }
}

/// Cached CDX listing for one entity.
///
/// Written once per cache miss as a whole; never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdxCacheEntry {
    /// Video or channel id
    pub key: String,
    pub fetched_at: DateTime<Utc>,
    /// Eligible snapshots, oldest first
    pub snapshots: Vec<CdxSnapshot>,
    /// Row count returned by the index before filtering
    pub raw_count: usize,
}

impl CdxCacheEntry {
    /// Whether the entry is younger than `ttl` at `now`.
    pub fn is_fresh(&self, ttl: std::time::Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.fetched_at);
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => age < ttl,
            Err(_) => true,
        }
    }
}

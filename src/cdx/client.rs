//! CDX index client.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use url::Url;

use super::cache::CdxCache;
use super::types::{CdxCacheEntry, CdxSnapshot};
use crate::error_handling::{is_retriable, CdxError, FetchError};
use crate::fetch::HttpFetcher;

/// Looks up eligible snapshots of a target URL, with an on-disk cache per entity.
#[derive(Clone)]
pub struct CdxClient {
    fetcher: HttpFetcher,
    endpoint: Url,
    cache: CdxCache,
    ttl: Duration,
}

impl CdxClient {
    /// Creates a client for the CDX endpoint at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `CdxError::Endpoint` if `endpoint` is not an absolute URL.
    pub fn new(
        fetcher: HttpFetcher,
        endpoint: &str,
        cache: CdxCache,
        ttl: Duration,
    ) -> Result<Self, CdxError> {
        let endpoint = Url::parse(endpoint).map_err(|_| CdxError::Endpoint(endpoint.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(CdxError::Endpoint(endpoint.to_string()));
        }
        Ok(Self {
            fetcher,
            endpoint,
            cache,
            ttl,
        })
    }

    pub fn cache(&self) -> &CdxCache {
        &self.cache
    }

    /// Returns the eligible snapshots of `url`, oldest first.
    ///
    /// A fresh cache entry for `entity_id` is returned without contacting the
    /// index. Otherwise the index is queried, rows are filtered and sorted, and
    /// the full list replaces the cache entry.
    ///
    /// # Errors
    ///
    /// - `CdxError::Unreachable` when no connection to the index can be made
    /// - `CdxError::Query` when the index keeps failing after retries
    /// - `CdxError::Decode` when the response is not a JSON array of rows
    /// - `CdxError::Cache` when the cache entry cannot be written
    pub async fn get_snapshots(
        &self,
        entity_id: &str,
        url: &str,
    ) -> Result<Vec<CdxSnapshot>, CdxError> {
        if let Some(entry) = self.cache.load(entity_id) {
            if entry.is_fresh(self.ttl, Utc::now()) {
                log::debug!(
                    "CDX cache hit for {} ({} snapshots, {} raw rows)",
                    entity_id,
                    entry.snapshots.len(),
                    entry.raw_count
                );
                return Ok(entry.snapshots);
            }
            log::debug!("CDX cache entry for {} is stale; refreshing", entity_id);
        }

        let query_url = self.query_url(url);
        let body = self
            .fetcher
            .get_text_retrying(&query_url, retry_index_query)
            .await
            .map_err(|source| match source {
                FetchError::Connect { .. } => CdxError::Unreachable {
                    endpoint: self.endpoint.to_string(),
                    source,
                },
                source => CdxError::Query {
                    url: url.to_string(),
                    source,
                },
            })?;

        let (rows, raw_count) = parse_rows(&body).map_err(|source| CdxError::Decode {
            url: url.to_string(),
            source,
        })?;
        let snapshots = select_eligible(rows);
        log::info!(
            "CDX index lists {} capture(s) of {}, {} eligible",
            raw_count,
            url,
            snapshots.len()
        );

        self.cache.store(&CdxCacheEntry {
            key: entity_id.to_string(),
            fetched_at: Utc::now(),
            snapshots: snapshots.clone(),
            raw_count,
        })?;

        Ok(snapshots)
    }

    fn query_url(&self, url: &str) -> Url {
        let mut query_url = self.endpoint.clone();
        query_url
            .query_pairs_mut()
            .append_pair("url", url)
            .append_pair("output", "json")
            .append_pair("matchType", "exact")
            .append_pair("filter", "statuscode:200")
            .append_pair("filter", "mimetype:text/html");
        query_url
    }
}

/// Transient index failures are retried. A failed connection means the
/// endpoint is wrong or down for every entity, so it is reported at once.
fn retry_index_query(error: &FetchError) -> bool {
    !matches!(error, FetchError::Connect { .. }) && is_retriable(error)
}

/// Parses a CDX JSON response into snapshot rows.
///
/// The first row is a header naming the columns; data rows are decoded by
/// column name. Rows whose status code or timestamp cannot be read are dropped
/// here, and an empty body means no captures. The returned count covers every
/// data row the index listed, dropped ones included.
pub(crate) fn parse_rows(body: &str) -> Result<(Vec<CdxSnapshot>, usize), serde_json::Error> {
    if body.trim().is_empty() {
        return Ok((Vec::new(), 0));
    }

    let table: Vec<Vec<String>> = serde_json::from_str(body)?;
    let mut rows = table.into_iter();
    let Some(header) = rows.next() else {
        return Ok((Vec::new(), 0));
    };
    let raw_count = rows.len();
    let columns: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let field = |row: &[String], name: &str| -> Option<String> {
        columns.get(name).and_then(|&i| row.get(i)).cloned()
    };

    let mut snapshots = Vec::new();
    for row in rows {
        let Some(timestamp) = field(&row, "timestamp") else {
            continue;
        };
        if timestamp.len() != 14 || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Some(status_code) = field(&row, "statuscode").and_then(|s| s.parse::<u16>().ok())
        else {
            continue;
        };
        snapshots.push(CdxSnapshot {
            timestamp,
            original_url: field(&row, "original").unwrap_or_default(),
            mimetype: field(&row, "mimetype").unwrap_or_default(),
            status_code,
            digest: field(&row, "digest").unwrap_or_default(),
            content_length: field(&row, "length")
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0),
        });
    }
    Ok((snapshots, raw_count))
}

/// Filters to eligible snapshots, sorts oldest first and collapses runs of
/// identical captures (same digest) to the oldest one.
pub(crate) fn select_eligible(rows: Vec<CdxSnapshot>) -> Vec<CdxSnapshot> {
    let mut eligible: Vec<CdxSnapshot> = rows.into_iter().filter(|s| s.is_eligible()).collect();
    eligible.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    eligible.dedup_by(|later, earlier| !later.digest.is_empty() && later.digest == earlier.digest);
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        r#"["urlkey","timestamp","original","mimetype","statuscode","digest","length"]"#;

    fn body(rows: &[&str]) -> String {
        let mut all = vec![HEADER.to_string()];
        all.extend(rows.iter().map(|r| r.to_string()));
        format!("[{}]", all.join(","))
    }

    #[test]
    fn test_parse_rows_skips_header() {
        let body = body(&[
            r#"["com,youtube)/watch?v=abc","20120105123000","https://www.youtube.com/watch?v=abc","text/html","200","AAA","41234"]"#,
        ]);
        let (rows, raw_count) = parse_rows(&body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(raw_count, 1);
        assert_eq!(rows[0].timestamp, "20120105123000");
        assert_eq!(rows[0].original_url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(rows[0].status_code, 200);
        assert_eq!(rows[0].content_length, 41234);
    }

    #[test]
    fn test_parse_rows_by_column_name() {
        let body = r#"[["timestamp","length","statuscode","mimetype","original","digest"],
                       ["20150101000000","9000","200","text/html","http://youtube.com/watch?v=x","Z"]]"#;
        let (rows, _) = parse_rows(body).unwrap();
        assert_eq!(rows[0].content_length, 9000);
        assert_eq!(rows[0].digest, "Z");
        assert_eq!(rows[0].mimetype, "text/html");
    }

    #[test]
    fn test_parse_rows_empty_bodies() {
        for empty in ["", "  \n", "[]", body(&[]).as_str()] {
            let (rows, raw_count) = parse_rows(empty).unwrap();
            assert!(rows.is_empty());
            assert_eq!(raw_count, 0);
        }
    }

    #[test]
    fn test_parse_rows_drops_unreadable_rows() {
        let body = body(&[
            r#"["k","20120105123000","u","text/html","-","AAA","41234"]"#,
            r#"["k","2012","u","text/html","200","AAA","41234"]"#,
            r#"["k","20120105123001","u","text/html","200","BBB","-"]"#,
        ]);
        let (rows, raw_count) = parse_rows(&body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content_length, 0);
        assert_eq!(raw_count, 3);
    }

    #[test]
    fn test_parse_rows_rejects_non_json() {
        assert!(parse_rows("<html>Service Unavailable</html>").is_err());
    }

    #[test]
    fn test_select_eligible_filters_and_sorts() {
        let body = body(&[
            r#"["k","20160101000000","u","text/html","200","C","60000"]"#,
            r#"["k","20110101000000","u","text/html","200","A","60000"]"#,
            r#"["k","20120101000000","u","text/html","302","R","60000"]"#,
            r#"["k","20130101000000","u","text/html","200","S","1200"]"#,
            r#"["k","20140101000000","u","warc/revisit","200","W","60000"]"#,
            r#"["k","20150101000000","u","text/html","200","B","60000"]"#,
        ]);
        let eligible = select_eligible(parse_rows(&body).unwrap().0);
        let timestamps: Vec<_> = eligible.iter().map(|s| s.timestamp.as_str()).collect();
        assert_eq!(
            timestamps,
            vec!["20110101000000", "20150101000000", "20160101000000"]
        );
    }

    #[test]
    fn test_select_eligible_collapses_identical_captures() {
        let body = body(&[
            r#"["k","20110101000000","u","text/html","200","SAME","60000"]"#,
            r#"["k","20110201000000","u","text/html","200","SAME","60000"]"#,
            r#"["k","20110301000000","u","text/html","200","OTHER","60000"]"#,
            r#"["k","20110401000000","u","text/html","200","SAME","60000"]"#,
        ]);
        let eligible = select_eligible(parse_rows(&body).unwrap().0);
        let timestamps: Vec<_> = eligible.iter().map(|s| s.timestamp.as_str()).collect();
        assert_eq!(
            timestamps,
            vec!["20110101000000", "20110301000000", "20110401000000"]
        );
    }

    #[test]
    fn test_client_rejects_invalid_endpoint() {
        let fetcher = HttpFetcher::new(
            reqwest::Client::new(),
            std::sync::Arc::new(crate::initialization::RateLimiter::unlimited()),
            crate::error_handling::RetryPolicy::default(),
        );
        let result = CdxClient::new(
            fetcher,
            "not a url",
            CdxCache::new("/tmp/unused"),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(CdxError::Endpoint(_))));
    }
}

// Shared test helpers for archive mocks and orchestrator setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

#![allow(dead_code)] // Each test file uses a different subset

use std::path::Path;

use wayback_recovery::{build_orchestrator, Config, RecoveryOrchestrator};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const VIDEO_ID: &str = "abc123def45";
pub const CHANNEL_ID: &str = "UCuAXFkgsw1L7xaCfnd5JJOw";

const CDX_HEADER: &str =
    r#"["urlkey","timestamp","original","mimetype","statuscode","digest","length"]"#;

/// A page whose only content is a removal notice.
pub const REMOVED_PAGE: &str = r#"<html><head><title>YouTube</title></head><body>
<div id="unavailable-message">This video has been removed by the uploader.</div>
</body></html>"#;

/// A page with neither metadata nor a removal notice.
pub const EMPTY_PAGE: &str = "<html><head></head><body><p>Loading</p></body></html>";

/// A watch page whose embedded player response carries the metadata.
pub fn watch_page(title: &str) -> String {
    format!(
        r#"<html><head><title>{title} - YouTube</title></head><body>
<script>var ytInitialPlayerResponse = {{"playabilityStatus":{{"status":"OK"}},
"videoDetails":{{"videoId":"{VIDEO_ID}","title":"{title}","channelId":"{CHANNEL_ID}",
"author":"Some Channel","viewCount":"42","lengthSeconds":"61"}}}};</script>
</body></html>"#
    )
}

/// A channel page whose embedded initial data carries the metadata.
pub fn channel_page(title: &str) -> String {
    format!(
        r#"<html><head><title>{title} - YouTube</title></head><body>
<script>var ytInitialData = {{"metadata":{{"channelMetadataRenderer":{{"title":"{title}",
"description":"About {title}","externalId":"{CHANNEL_ID}"}}}}}};</script>
</body></html>"#
    )
}

/// One CDX data row for `original`.
pub fn cdx_row(
    original: &str,
    timestamp: &str,
    mimetype: &str,
    status: &str,
    digest: &str,
    length: u64,
) -> String {
    format!(
        r#"["com,youtube)/x","{timestamp}","{original}","{mimetype}","{status}","{digest}","{length}"]"#
    )
}

/// CDX response listing eligible captures of `original` at `timestamps`.
pub fn cdx_body(original: &str, timestamps: &[&str]) -> String {
    let rows: Vec<String> = timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| cdx_row(original, ts, "text/html", "200", &format!("DIGEST{i}"), 90_000))
        .collect();
    cdx_table(&rows)
}

/// Wraps data rows in a CDX response with its header row.
pub fn cdx_table(rows: &[String]) -> String {
    let mut all = vec![CDX_HEADER.to_string()];
    all.extend(rows.iter().cloned());
    format!("[{}]", all.join(","))
}

pub fn video_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

pub fn channel_url(id: &str) -> String {
    format!("https://www.youtube.com/channel/{id}")
}

/// Serves `body` as the CDX listing for `target`.
pub async fn mount_cdx(server: &MockServer, target: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .and(query_param("url", target))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serves `body` as the replay of every capture taken at `timestamp`.
pub async fn mount_snapshot(server: &MockServer, timestamp: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path_regex(format!("^/web/{timestamp}/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

/// Configuration pointing every endpoint at `server`, without throttling or retries.
pub fn test_config(server_uri: &str, cache_dir: &Path) -> Config {
    Config {
        cache_dir: cache_dir.to_path_buf(),
        cdx_base_url: format!("{server_uri}/cdx"),
        replay_base_url: format!("{server_uri}/web"),
        rate_limit_rps: 0,
        retry_max_attempts: 1,
        timeout_seconds: 5,
        ..Default::default()
    }
}

pub fn test_orchestrator(server_uri: &str, cache_dir: &Path) -> RecoveryOrchestrator {
    build_orchestrator(&test_config(server_uri, cache_dir)).expect("Failed to build orchestrator")
}

/// An address nothing listens on, so every connection is refused.
pub fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// An orchestrator whose index endpoint refuses connections. Retries are
/// generous so a retried connection failure would outlast any test timeout.
pub fn unreachable_index_orchestrator(
    replay_uri: &str,
    cache_dir: &Path,
) -> RecoveryOrchestrator {
    let config = Config {
        cdx_base_url: format!("{}/cdx", closed_port_uri()),
        retry_max_attempts: 4,
        retry_initial_delay_ms: 10_000,
        ..test_config(replay_uri, cache_dir)
    };
    build_orchestrator(&config).expect("Failed to build orchestrator")
}

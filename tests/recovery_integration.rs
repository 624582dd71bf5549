//! End-to-end recovery against a mocked archive.

mod helpers;

use std::time::Duration;

use chrono::Utc;
use helpers::*;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wayback_recovery::cdx::CdxCacheEntry;
use wayback_recovery::error_handling::CdxError;
use wayback_recovery::{EntityKind, FailureKind, RecoveryError, RecoveryReport};
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_recovers_from_first_snapshot_without_removal_notice() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(
        &server,
        &video_url(VIDEO_ID),
        cdx_body(
            &video_url(VIDEO_ID),
            &["20180101000000", "20190101000000", "20200101000000"],
        ),
    )
    .await;
    mount_snapshot(&server, "20180101000000", REMOVED_PAGE).await;
    mount_snapshot(&server, "20190101000000", REMOVED_PAGE).await;
    mount_snapshot(&server, "20200101000000", &watch_page("Recovered")).await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let result = orchestrator
        .recover_video(VIDEO_ID, None, Utc::now())
        .await
        .unwrap();

    assert!(result.success, "unexpected failure: {:?}", result.failure_reason);
    assert_eq!(result.snapshot_used.as_deref(), Some("20200101000000"));
    assert_eq!(result.snapshots_available, 3);
    assert_eq!(result.snapshots_tried, 3);
    assert!(result.failure_reason.is_none());
    assert!(result.fields_recovered.contains("title"));
    assert!(result.fields_skipped.contains("like_count"));
    assert!(result.channel_recovery_candidates.contains(CHANNEL_ID));
    let data = result.data.unwrap();
    assert_eq!(data.title.as_deref(), Some("Recovered"));
    assert_eq!(data.view_count, Some(42));
    assert_eq!(data.duration_seconds, Some(61));
}

#[tokio::test]
async fn test_stops_at_first_usable_snapshot() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(
        &server,
        &video_url(VIDEO_ID),
        cdx_body(&video_url(VIDEO_ID), &["20180101000000", "20190101000000"]),
    )
    .await;
    mount_snapshot(&server, "20180101000000", &watch_page("First")).await;
    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex("^/web/20190101000000/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(watch_page("Second")))
        .expect(0)
        .mount(&server)
        .await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let result = orchestrator
        .recover_video(VIDEO_ID, None, Utc::now())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.snapshots_tried, 1);
    assert_eq!(result.data.unwrap().title.as_deref(), Some("First"));
}

#[tokio::test]
async fn test_recent_recovery_is_skipped_without_io() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let cache = TempDir::new().unwrap();

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let now = Utc::now();
    let result = orchestrator
        .recover_video(VIDEO_ID, Some(now - chrono::Duration::minutes(2)), now)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.snapshots_tried, 0);
    assert_eq!(result.snapshots_available, 0);
    assert!(result.data.is_none());
    assert!(result.fields_recovered.is_empty());
}

#[tokio::test]
async fn test_old_recovery_is_not_skipped() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(
        &server,
        &video_url(VIDEO_ID),
        cdx_body(&video_url(VIDEO_ID), &["20180101000000"]),
    )
    .await;
    mount_snapshot(&server, "20180101000000", &watch_page("Again")).await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let now = Utc::now();
    let result = orchestrator
        .recover_video(VIDEO_ID, Some(now - chrono::Duration::minutes(10)), now)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.snapshots_tried, 1);
}

#[tokio::test]
async fn test_exhaustion_reports_last_failure() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(
        &server,
        &video_url(VIDEO_ID),
        cdx_body(&video_url(VIDEO_ID), &["20180101000000", "20190101000000"]),
    )
    .await;
    mount_snapshot(&server, "20180101000000", EMPTY_PAGE).await;
    mount_snapshot(&server, "20190101000000", REMOVED_PAGE).await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let result = orchestrator
        .recover_video(VIDEO_ID, None, Utc::now())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.snapshots_available, 2);
    assert_eq!(result.snapshots_tried, 2);
    assert!(result.snapshot_used.is_none());
    assert!(result.data.is_none());
    assert_eq!(result.failure_kind, Some(FailureKind::RemovalNotice));
    let reason = result.failure_reason.unwrap();
    assert!(reason.starts_with("tried 2 of 2 snapshots"), "{reason}");
}

#[tokio::test]
async fn test_unfetchable_snapshot_is_skipped() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(
        &server,
        &video_url(VIDEO_ID),
        cdx_body(&video_url(VIDEO_ID), &["20180101000000", "20190101000000"]),
    )
    .await;
    // No replay mock for the first capture: the mock server answers 404
    mount_snapshot(&server, "20190101000000", &watch_page("Survivor")).await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let result = orchestrator
        .recover_video(VIDEO_ID, None, Utc::now())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.snapshots_tried, 2);
    assert_eq!(result.snapshot_used.as_deref(), Some("20190101000000"));
}

#[tokio::test]
async fn test_no_snapshots() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(&server, &video_url(VIDEO_ID), cdx_table(&[])).await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let result = orchestrator
        .recover_video(VIDEO_ID, None, Utc::now())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.snapshots_available, 0);
    assert_eq!(result.snapshots_tried, 0);
    assert_eq!(result.failure_kind, Some(FailureKind::NoSnapshots));
    assert_eq!(result.failure_reason.as_deref(), Some("no snapshots available"));
}

#[tokio::test]
async fn test_index_failure_is_reported_on_result() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let result = orchestrator
        .recover_video(VIDEO_ID, None, Utc::now())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.failure_kind, Some(FailureKind::IndexUnavailable));
    assert!(result
        .failure_reason
        .unwrap()
        .starts_with("snapshot index unavailable"));
    assert!(orchestrator.cdx().cache().load(VIDEO_ID).is_none());
}

#[tokio::test]
async fn test_unwritable_cache_is_fatal() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let cache_dir = temp.path().join("cache");
    mount_cdx(
        &server,
        &video_url(VIDEO_ID),
        cdx_body(&video_url(VIDEO_ID), &["20180101000000"]),
    )
    .await;

    let orchestrator = test_orchestrator(&server.uri(), &cache_dir);
    // Replace the cache directory with a plain file after startup
    std::fs::remove_dir_all(&cache_dir).unwrap();
    std::fs::write(&cache_dir, b"not a directory").unwrap();

    let err = orchestrator
        .recover_video(VIDEO_ID, None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, RecoveryError::Cdx(CdxError::Cache { .. })));
}

#[tokio::test]
async fn test_cancelled_before_first_snapshot() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(
        &server,
        &video_url(VIDEO_ID),
        cdx_body(&video_url(VIDEO_ID), &["20180101000000", "20190101000000"]),
    )
    .await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = orchestrator
        .recover_cancellable(VIDEO_ID, EntityKind::Video, None, Utc::now(), &cancel)
        .await
        .unwrap();

    assert!(!report.success());
    assert_eq!(report.snapshots_tried(), 0);
    assert_eq!(report.failure_kind(), Some(FailureKind::Cancelled));
    let RecoveryReport::Video(result) = report else {
        panic!("expected a video result");
    };
    assert_eq!(
        result.failure_reason.as_deref(),
        Some("cancelled after 0 of 2 snapshots")
    );
}

#[tokio::test]
async fn test_channel_recovery() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(
        &server,
        &channel_url(CHANNEL_ID),
        cdx_body(&channel_url(CHANNEL_ID), &["20210101000000"]),
    )
    .await;
    mount_snapshot(&server, "20210101000000", &channel_page("Chan")).await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let report = orchestrator
        .recover(CHANNEL_ID, EntityKind::Channel, None, Utc::now())
        .await
        .unwrap();

    let RecoveryReport::Channel(result) = report else {
        panic!("expected a channel result");
    };
    assert!(result.success);
    assert!(result.fields_recovered.contains("title"));
    assert!(result.fields_recovered.contains("description"));
    assert!(result.fields_skipped.contains("banner_url"));
    let data = result.data.unwrap();
    assert_eq!(data.title.as_deref(), Some("Chan"));
    assert_eq!(data.channel_id.as_deref(), Some(CHANNEL_ID));
}

#[tokio::test]
async fn test_result_serializes_with_kind_tag() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_cdx(&server, &video_url(VIDEO_ID), cdx_table(&[])).await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let report = orchestrator
        .recover(VIDEO_ID, EntityKind::Video, None, Utc::now())
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kind"], "video");
    assert_eq!(json["entity_id"], VIDEO_ID);
    assert_eq!(json["failure_kind"], "no_snapshots");
}

#[tokio::test]
async fn test_fresh_cache_entry_avoids_index_query() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(cdx_body(&video_url(VIDEO_ID), &["20180101000000"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let target = video_url(VIDEO_ID);
    let first = orchestrator.cdx().get_snapshots(VIDEO_ID, &target).await.unwrap();
    let second = orchestrator.cdx().get_snapshots(VIDEO_ID, &target).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);

    let entry = orchestrator.cdx().cache().load(VIDEO_ID).unwrap();
    assert_eq!(entry.raw_count, 1);
    assert_eq!(entry.snapshots, first);
}

#[tokio::test]
async fn test_stale_cache_entry_is_refreshed() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(cdx_body(
                &video_url(VIDEO_ID),
                &["20180101000000", "20190101000000"],
            )),
        )
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    orchestrator
        .cdx()
        .cache()
        .store(&CdxCacheEntry {
            key: VIDEO_ID.to_string(),
            fetched_at: Utc::now() - chrono::Duration::days(2),
            snapshots: Vec::new(),
            raw_count: 0,
        })
        .unwrap();

    let snapshots = orchestrator
        .cdx()
        .get_snapshots(VIDEO_ID, &video_url(VIDEO_ID))
        .await
        .unwrap();
    assert_eq!(snapshots.len(), 2);

    let entry = orchestrator.cdx().cache().load(VIDEO_ID).unwrap();
    assert!(entry.is_fresh(Duration::from_secs(60), Utc::now()));
}

#[tokio::test]
async fn test_index_rows_are_filtered_sorted_and_deduplicated() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    let target = video_url(VIDEO_ID);
    let rows = vec![
        cdx_row(&target, "20200101000000", "text/html", "200", "C", 90_000),
        cdx_row(&target, "20150101000000", "text/html", "200", "A", 90_000),
        cdx_row(&target, "20160101000000", "text/html", "200", "A", 90_000),
        cdx_row(&target, "20170101000000", "text/html", "301", "B", 90_000),
        cdx_row(&target, "20180101000000", "application/json", "200", "D", 90_000),
        cdx_row(&target, "20190101000000", "text/html", "200", "E", 1_200),
        cdx_row(&target, "20210101000000", "text/html", "-", "F", 90_000),
        cdx_row(&target, "2021", "text/html", "200", "G", 90_000),
    ];
    mount_cdx(&server, &target, cdx_table(&rows)).await;

    let orchestrator = test_orchestrator(&server.uri(), cache.path());
    let snapshots = orchestrator.cdx().get_snapshots(VIDEO_ID, &target).await.unwrap();
    let timestamps: Vec<&str> = snapshots.iter().map(|s| s.timestamp.as_str()).collect();
    assert_eq!(timestamps, vec!["20150101000000", "20200101000000"]);

    let entry = orchestrator.cdx().cache().load(VIDEO_ID).unwrap();
    assert_eq!(entry.raw_count, 8);
}

#[tokio::test]
async fn test_unreachable_index_is_fatal_without_retrying() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    let orchestrator = unreachable_index_orchestrator(&server.uri(), cache.path());

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.recover(VIDEO_ID, EntityKind::Video, None, Utc::now()),
    )
    .await
    .expect("a refused connection should not be retried");

    match outcome {
        Err(RecoveryError::Cdx(CdxError::Unreachable { .. })) => {}
        other => panic!("expected an unreachable index, got {other:?}"),
    }
    assert!(orchestrator.cdx().cache().load(VIDEO_ID).is_none());
}

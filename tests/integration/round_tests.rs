//! Frontier scanning, backfill, full rounds and the multi-round driver

use crate::support::*;
use thread_mirror::config::SyncLimits;
use thread_mirror::output::MemoryProgress;
use thread_mirror::storage::Storage;
use thread_mirror::sync::{drive_rounds, RoundOutcome};
use thread_mirror::Credentials;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Page 1 of the newest-threads listing used by the frontier scenarios
fn frontier_page() -> Vec<(i64, i64)> {
    let mut entries: Vec<(i64, i64)> = (501..=510).rev().map(|id| (id, 0)).collect();
    entries.push((499, 0));
    entries
}

#[tokio::test]
async fn test_frontier_stops_at_known_thread() {
    let server = MockServer::start().await;
    mount_listing(&server, "newthread", 1, &frontier_page()).await;
    Mock::given(method("GET"))
        .and(path("/_/forum/toplist"))
        .and(query_param("idlist", "newthread"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body("newthread", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 500, 0, 1);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let scan = engine
        .context(&creds, &progress)
        .scan_frontier()
        .await
        .unwrap();

    assert_eq!(scan.latest_known_id, 500);
    assert_eq!(scan.api_latest_id, Some(510));
    assert_eq!(scan.discovered, (501..=510).rev().collect::<Vec<_>>());
    assert!(!scan.overflow());
}

#[tokio::test]
async fn test_frontier_keeps_partial_results_on_failed_page() {
    let server = MockServer::start().await;
    mount_listing(&server, "newthread", 1, &[(30, 0), (29, 0)]).await;
    Mock::given(method("GET"))
        .and(path("/_/forum/toplist"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let scan = engine
        .context(&creds, &progress)
        .scan_frontier()
        .await
        .unwrap();

    assert_eq!(scan.latest_known_id, 0);
    assert_eq!(scan.discovered, vec![30, 29]);
    assert!(progress.contains("Newest threads page 2 failed"));
}

#[tokio::test]
async fn test_round_processes_discovered_threads() {
    let server = MockServer::start().await;
    mount_listing(&server, "newthread", 1, &frontier_page()).await;
    mount_listing(&server, "newreply", 1, &[(510, 3), (500, 0)]).await;
    mount_forum(&server, FakeForum::new().with_threads(501..=510, 3)).await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 500, 0, 1);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let outcome = engine.run_round(&creds, &progress).await.unwrap();

    assert_eq!(
        outcome,
        RoundOutcome {
            has_more: false,
            processed_new_threads: 10,
            updated_replies: 0,
        }
    );

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_threads().unwrap(), 11);
    assert_eq!(storage.stored_replies(505).unwrap(), Some(3));
    assert!(progress.contains("Found 10 new threads, processing 10 this round"));
}

#[tokio::test]
async fn test_round_overflow_sets_has_more() {
    let server = MockServer::start().await;
    let listed: Vec<(i64, i64)> = (101..=120).rev().map(|id| (id, 0)).collect();
    mount_listing(&server, "newthread", 1, &listed).await;
    mount_listing(&server, "newthread", 2, &[]).await;
    mount_listing(&server, "newreply", 1, &[(120, 0)]).await;
    mount_forum(&server, FakeForum::new().with_threads(101..=120, 0)).await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let outcome = engine.run_round(&creds, &progress).await.unwrap();

    assert!(outcome.has_more);
    assert_eq!(outcome.processed_new_threads, 15);

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_threads().unwrap(), 15);
    assert!(storage.thread_exists(106).unwrap());
    assert!(!storage.thread_exists(105).unwrap());
}

#[tokio::test]
async fn test_batch_failure_is_isolated() {
    let server = MockServer::start().await;
    let listed: Vec<(i64, i64)> = (201..=205).rev().map(|id| (id, 0)).collect();
    mount_listing(&server, "newthread", 1, &listed).await;
    mount_listing(&server, "newthread", 2, &[]).await;
    mount_listing(&server, "newreply", 1, &[(205, 0)]).await;
    mount_forum(
        &server,
        FakeForum::new().with_threads(201..=205, 0).failing(203),
    )
    .await;

    let limits = SyncLimits {
        max_concurrent: 5,
        ..test_limits()
    };
    let engine = create_engine(&server, limits);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let outcome = engine.run_round(&creds, &progress).await.unwrap();
    assert_eq!(outcome.processed_new_threads, 4);
    assert!(!outcome.has_more);

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    for id in [201, 202, 204, 205] {
        assert!(storage.thread_exists(id).unwrap(), "thread {} missing", id);
    }
    assert!(!storage.thread_exists(203).unwrap());
    assert!(!storage.is_tombstoned(203).unwrap());
    assert!(progress.contains("[203] Failed to process thread"));
}

#[tokio::test]
async fn test_backfill_repairs_gaps_and_skips_tombstones() {
    let server = MockServer::start().await;
    mount_listing(&server, "newthread", 1, &[(510, 0)]).await;
    mount_listing(&server, "newreply", 1, &[(510, 0)]).await;
    mount_forum(&server, FakeForum::new().with_threads([507, 508, 510], 0)).await;

    let limits = SyncLimits {
        backfill_window: 5,
        ..test_limits()
    };
    let engine = create_engine(&server, limits);
    seed_thread(&engine, 510, 0, 1);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let report = engine
        .context(&creds, &progress)
        .audit_backfill(510)
        .await
        .unwrap();
    assert_eq!(report.checked, 5);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.failed, 0);

    {
        let storage = engine.storage();
        let storage = storage.lock().unwrap();
        assert!(storage.thread_exists(507).unwrap());
        assert!(storage.thread_exists(508).unwrap());
        for id in [505, 506, 509] {
            assert!(storage.is_tombstoned(id).unwrap(), "{} not tombstoned", id);
        }
    }

    // Later rounds re-scan the window without touching known IDs
    engine.run_round(&creds, &progress).await.unwrap();
    engine.run_round(&creds, &progress).await.unwrap();

    assert_eq!(detail_pages_requested(&server, 509).await, vec![1]);
    assert_eq!(detail_pages_requested(&server, 507).await, vec![1]);
    assert!(detail_pages_requested(&server, 504).await.is_empty());
}

#[tokio::test]
async fn test_backfill_failure_does_not_stop_scan() {
    let server = MockServer::start().await;
    mount_forum(
        &server,
        FakeForum::new().with_threads([48, 49, 50], 0).failing(49),
    )
    .await;

    let limits = SyncLimits {
        backfill_window: 2,
        ..test_limits()
    };
    let engine = create_engine(&server, limits);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let report = engine
        .context(&creds, &progress)
        .audit_backfill(50)
        .await
        .unwrap();

    assert_eq!(report.checked, 3);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.failed, 1);
    assert!(progress.contains("[49] Backfill fetch failed"));
}

#[tokio::test]
async fn test_drive_rounds_until_caught_up() {
    let server = MockServer::start().await;
    let listed: Vec<(i64, i64)> = (101..=120).rev().map(|id| (id, 0)).collect();
    mount_listing(&server, "newthread", 1, &listed).await;
    mount_listing(&server, "newthread", 2, &[]).await;
    mount_listing(&server, "newreply", 1, &[(120, 0)]).await;
    mount_forum(&server, FakeForum::new().with_threads(101..=120, 0)).await;

    // The backfill window reaches the threads left over by the cap
    let limits = SyncLimits {
        backfill_window: 30,
        ..test_limits()
    };
    let engine = create_engine(&server, limits);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let summary = drive_rounds(&engine, &creds, &progress).await.unwrap();

    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.processed_new_threads, 15);
    assert!(!summary.has_more);
    assert!(progress.contains("Caught up after 2 rounds"));

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_threads().unwrap(), 20);
    // IDs 90 through 100 do not exist on the forum
    assert_eq!(storage.count_tombstones().unwrap(), 11);
    assert_eq!(storage.count_rounds().unwrap(), 2);

    let last = storage.latest_round().unwrap().expect("round recorded");
    assert!(!last.has_more);
    assert_eq!(last.processed_new_threads, 0);
}

#[tokio::test]
async fn test_drive_rounds_stops_at_round_limit() {
    let server = MockServer::start().await;
    let listed: Vec<(i64, i64)> = (101..=120).rev().map(|id| (id, 0)).collect();
    mount_listing(&server, "newthread", 1, &listed).await;
    mount_listing(&server, "newthread", 2, &[]).await;
    mount_listing(&server, "newreply", 1, &[(120, 0)]).await;
    mount_forum(&server, FakeForum::new().with_threads(101..=120, 0)).await;

    let limits = SyncLimits {
        max_rounds: 1,
        ..test_limits()
    };
    let engine = create_engine(&server, limits);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let summary = drive_rounds(&engine, &creds, &progress).await.unwrap();

    assert_eq!(summary.rounds, 1);
    assert!(summary.has_more);
    assert!(progress.contains("Stopped after 1 rounds with work remaining"));

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_rounds().unwrap(), 1);
}

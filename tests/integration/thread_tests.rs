//! Single-thread operations: full fetch, incremental fetch, on-demand check

use crate::support::*;
use thread_mirror::output::MemoryProgress;
use thread_mirror::storage::{Storage, ThreadRecord};
use thread_mirror::sync::{ThreadCheck, ThreadFetch};
use thread_mirror::{Credentials, SyncError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_thread_persists_first_page() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(100, 4, 5)).await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let fetch = engine
        .context(&creds, &progress)
        .fetch_thread(100)
        .await
        .expect("fetch should succeed");
    assert_eq!(fetch, ThreadFetch::Stored { comments: 5 });

    let storage = engine.storage();
    let storage = storage.lock().unwrap();

    let thread = storage.get_thread(100).unwrap().expect("thread stored");
    assert_eq!(thread.subject, "Thread 100");
    assert_eq!(thread.author, "alice");
    assert_eq!(thread.views, 42);
    assert_eq!(thread.replies, 4);
    assert_eq!(thread.created_at, 1_700_000_000);

    let comments = storage.get_comments(100).unwrap();
    assert_eq!(comments.len(), 5);
    assert!(comments[0].is_first);
    assert!(!comments[1].is_first);
    assert_eq!(comments[2].position, 3);
    assert_eq!(comments[2].content, "post 3 of thread 100");
    // Fields the store does not model survive in the raw payload
    assert!(comments[0].raw_payload.contains("attachments"));

    assert!(progress.contains("[100] Synced \"Thread 100\" (5 posts)"));
}

#[tokio::test]
async fn test_fetch_thread_twice_is_idempotent() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(100, 12, 13)).await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();
    let ctx = engine.context(&creds, &progress);

    let snapshot = || {
        let storage = engine.storage();
        let storage = storage.lock().unwrap();
        let thread = storage.get_thread(100).unwrap().map(|t| ThreadRecord {
            last_synced: 0,
            ..t
        });
        (
            thread,
            storage.get_comments(100).unwrap(),
            storage.count_threads().unwrap(),
            storage.count_comments().unwrap(),
        )
    };

    ctx.fetch_thread(100).await.unwrap();
    let first = snapshot();
    ctx.fetch_thread(100).await.unwrap();
    let second = snapshot();

    assert_eq!(first, second);
    assert_eq!(second.2, 1);
    assert_eq!(second.3, 13);
}

#[tokio::test]
async fn test_not_found_is_tombstoned() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new()).await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();
    let ctx = engine.context(&creds, &progress);

    let fetch = ctx.fetch_thread(77).await.unwrap();
    assert_eq!(fetch, ThreadFetch::Tombstoned { status: 404 });

    // A second miss leaves the single tombstone in place
    ctx.fetch_thread(77).await.unwrap();

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    assert!(storage.is_tombstoned(77).unwrap());
    assert!(!storage.thread_exists(77).unwrap());
    assert_eq!(storage.count_tombstones().unwrap(), 1);
    assert!(progress.contains("[77] Inaccessible (status 404)"));
}

#[tokio::test]
async fn test_forbidden_is_tombstoned() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(78, 1, 1).forbidden(78)).await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let fetch = engine.context(&creds, &progress).fetch_thread(78).await.unwrap();
    assert_eq!(fetch, ThreadFetch::Tombstoned { status: 403 });
}

#[tokio::test]
async fn test_server_error_is_reported_without_writes() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(90, 1, 1).failing(90)).await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let result = engine.context(&creds, &progress).fetch_thread(90).await;
    assert!(matches!(
        result,
        Err(SyncError::HttpStatus { status: 500, .. })
    ));

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    assert!(!storage.thread_exists(90).unwrap());
    assert!(!storage.is_tombstoned(90).unwrap());
}

#[tokio::test]
async fn test_incomplete_detail_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_/post/list"))
        .and(query_param("thread_id", "55"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "thread": { "thread_id": 55, "subject": "no rows" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_/post/list"))
        .and(query_param("thread_id", "56"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": null })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_/post/list"))
        .and(query_param("thread_id", "70"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "thread": { "subject": "no id" },
                "rows": [{ "post_id": 1, "position": 1 }]
            }
        })))
        .mount(&server)
        .await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();
    let ctx = engine.context(&creds, &progress);

    assert_eq!(ctx.fetch_thread(55).await.unwrap(), ThreadFetch::Skipped);
    assert_eq!(ctx.fetch_thread(56).await.unwrap(), ThreadFetch::Skipped);
    assert_eq!(ctx.fetch_thread(70).await.unwrap(), ThreadFetch::Skipped);

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_threads().unwrap(), 0);
    assert_eq!(storage.count_tombstones().unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_/post/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let result = engine.context(&creds, &progress).fetch_thread(60).await;
    assert!(matches!(result, Err(SyncError::Decode { .. })));
}

#[tokio::test]
async fn test_incremental_fetch_writes_only_new_positions() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(100, 25, 25)).await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 100, 20, 20);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let written = engine
        .context(&creds, &progress)
        .fetch_new_comments(100, 25, 20)
        .await
        .unwrap();

    assert_eq!(written, 5);
    assert_eq!(stored_replies(&engine, 100), Some(25));

    {
        let storage = engine.storage();
        let storage = storage.lock().unwrap();
        let comments = storage.get_comments(100).unwrap();
        assert_eq!(comments.len(), 25);
        // Seeded rows keep their original payload, only new rows carry JSON
        assert_eq!(comments[19].raw_payload, "{}");
        assert!(comments[20].raw_payload.contains("\"position\":21"));
    }

    // Page 1 holds the last known post, page 2 is short and ends the scan
    assert_eq!(detail_pages_requested(&server, 100).await, vec![1, 2]);
}

#[tokio::test]
async fn test_incremental_fetch_without_new_rows_writes_nothing() {
    let server = MockServer::start().await;
    // The reply count is ahead of the posts the forum actually serves
    mount_forum(&server, FakeForum::new().with_thread(100, 25, 20)).await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 100, 20, 20);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let written = engine
        .context(&creds, &progress)
        .fetch_new_comments(100, 25, 20)
        .await
        .unwrap();

    assert_eq!(written, 0);
    assert_eq!(stored_replies(&engine, 100), Some(20));

    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    let thread = storage.get_thread(100).unwrap().unwrap();
    assert_eq!(thread.last_synced, 1_700_000_000);
}

#[tokio::test]
async fn test_incremental_fetch_starts_at_last_known_page() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(300, 47, 47)).await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 300, 45, 45);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let written = engine
        .context(&creds, &progress)
        .fetch_new_comments(300, 47, 45)
        .await
        .unwrap();

    assert_eq!(written, 2);
    assert_eq!(detail_pages_requested(&server, 300).await, vec![2, 3]);
}

#[tokio::test]
async fn test_incremental_fetch_respects_page_cap() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(200, 200, 200)).await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 200, 20, 20);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let written = engine
        .context(&creds, &progress)
        .fetch_new_comments(200, 200, 20)
        .await
        .unwrap();

    // Pages 1 to 4; page 1 contributes nothing new
    assert_eq!(written, 60);
    assert_eq!(detail_pages_requested(&server, 200).await, vec![1, 2, 3, 4]);
    assert_eq!(stored_replies(&engine, 200), Some(200));
}

#[tokio::test]
async fn test_incremental_fetch_failure_writes_nothing() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(100, 25, 25).failing(100)).await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 100, 20, 20);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let written = engine
        .context(&creds, &progress)
        .fetch_new_comments(100, 25, 20)
        .await
        .unwrap();

    assert_eq!(written, 0);
    assert_eq!(stored_replies(&engine, 100), Some(20));
}

#[tokio::test]
async fn test_incremental_fetch_keeps_pages_read_before_a_failure() {
    let server = MockServer::start().await;
    mount_forum(
        &server,
        FakeForum::new().with_thread(100, 30, 30).failing_page(100, 2),
    )
    .await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 100, 15, 15);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let written = engine
        .context(&creds, &progress)
        .fetch_new_comments(100, 30, 15)
        .await
        .unwrap();

    // Page 1 yields positions 16 to 20, page 2 fails and ends the scan
    assert_eq!(written, 5);
    assert_eq!(detail_pages_requested(&server, 100).await, vec![1, 2]);

    // The reply count still takes the listing value; 21 to 30 wait for a refetch
    assert_eq!(stored_replies(&engine, 100), Some(30));
    let storage = engine.storage();
    let storage = storage.lock().unwrap();
    let comments = storage.get_comments(100).unwrap();
    assert_eq!(comments.len(), 20);
    assert_eq!(comments.last().map(|c| c.position), Some(20));
}

#[tokio::test]
async fn test_check_unknown_thread_fetches_in_full() {
    let server = MockServer::start().await;
    mount_forum(&server, FakeForum::new().with_thread(100, 2, 3)).await;

    let engine = create_engine(&server, test_limits());
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let check = engine.check_thread(&creds, &progress, 100).await.unwrap();
    assert_eq!(check, ThreadCheck::Fetched(ThreadFetch::Stored { comments: 3 }));

    let check = engine.check_thread(&creds, &progress, 101).await.unwrap();
    assert_eq!(
        check,
        ThreadCheck::Fetched(ThreadFetch::Tombstoned { status: 404 })
    );
}

#[tokio::test]
async fn test_check_known_thread() {
    let server = MockServer::start().await;
    mount_forum(
        &server,
        FakeForum::new()
            .with_thread(100, 25, 25)
            .with_thread(101, 5, 5)
            .with_thread(102, 9, 9)
            .failing(102),
    )
    .await;

    let engine = create_engine(&server, test_limits());
    seed_thread(&engine, 100, 20, 20);
    seed_thread(&engine, 101, 5, 5);
    seed_thread(&engine, 102, 3, 3);
    let creds = Credentials::anonymous();
    let progress = MemoryProgress::new();

    let check = engine.check_thread(&creds, &progress, 100).await.unwrap();
    assert_eq!(check, ThreadCheck::Updated { new_comments: 5 });
    assert_eq!(stored_replies(&engine, 100), Some(25));
    assert!(progress.contains("[100] New replies found (20 -> 25)"));

    let check = engine.check_thread(&creds, &progress, 101).await.unwrap();
    assert_eq!(check, ThreadCheck::UpToDate { replies: 5 });

    let check = engine.check_thread(&creds, &progress, 102).await.unwrap();
    assert_eq!(check, ThreadCheck::Unavailable);
    assert_eq!(stored_replies(&engine, 102), Some(3));
}
